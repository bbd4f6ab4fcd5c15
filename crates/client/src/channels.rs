// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed subscription entry points, one per logical channel.
//!
//! A subscription derives the channel's endpoint from a typed filter,
//! shares (or opens) the manager's connection, and registers a listener for
//! every event type the channel carries. Unsubscribing removes exactly
//! those listeners; the connection stays up.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use pulse_core::protocol::kinds;

use crate::connection::{
    ConnectOutcome, ConnectionManager, Endpoint, ListenerId, ListenerResult, Transport,
    WebSocketTransport,
};
use crate::error::{Error, Result};

/// Channel names as accepted on the command line.
pub const CHANNEL_NAMES: [&str; 9] = [
    "logs",
    "tasks",
    "notifications",
    "workflows",
    "integrations",
    "load-balancing",
    "knowledge-progress",
    "knowledge-items",
    "knowledge-search",
];

/// A logical event stream multiplexed over the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Logs,
    Tasks,
    Notifications,
    Workflows,
    Integrations,
    LoadBalancing,
    KnowledgeProgress,
    KnowledgeItems,
    KnowledgeSearch,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::Logs,
        Channel::Tasks,
        Channel::Notifications,
        Channel::Workflows,
        Channel::Integrations,
        Channel::LoadBalancing,
        Channel::KnowledgeProgress,
        Channel::KnowledgeItems,
        Channel::KnowledgeSearch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::Logs => CHANNEL_NAMES[0],
            Channel::Tasks => CHANNEL_NAMES[1],
            Channel::Notifications => CHANNEL_NAMES[2],
            Channel::Workflows => CHANNEL_NAMES[3],
            Channel::Integrations => CHANNEL_NAMES[4],
            Channel::LoadBalancing => CHANNEL_NAMES[5],
            Channel::KnowledgeProgress => CHANNEL_NAMES[6],
            Channel::KnowledgeItems => CHANNEL_NAMES[7],
            Channel::KnowledgeSearch => CHANNEL_NAMES[8],
        }
    }

    /// Server endpoint path.
    pub fn endpoint_name(self) -> &'static str {
        match self {
            Channel::Logs => "logs",
            Channel::Tasks => "tasks",
            Channel::Notifications => "notifications",
            Channel::Workflows => "workflows",
            Channel::Integrations => "integrations",
            Channel::LoadBalancing => "load-balancing",
            Channel::KnowledgeProgress => "knowledge/progress",
            Channel::KnowledgeItems => "knowledge/items",
            Channel::KnowledgeSearch => "knowledge/search",
        }
    }

    /// Event types delivered on this channel.
    pub fn event_kinds(self) -> &'static [&'static str] {
        match self {
            Channel::Logs => &[kinds::LOG_ENTRY],
            Channel::Tasks => &[kinds::TASK_STATUS, kinds::TASK_PROGRESS, kinds::TASK_COMPLETE],
            Channel::Notifications => &[kinds::NOTIFICATION],
            Channel::Workflows => &[
                kinds::WORKFLOW_STATUS,
                kinds::WORKFLOW_PROGRESS,
                kinds::WORKFLOW_COMPLETE,
                kinds::WORKFLOW_FAILED,
            ],
            Channel::Integrations => &[
                kinds::INTEGRATION_EVENT,
                kinds::WEBHOOK_DELIVERY,
                kinds::QUEUE_UPDATE,
            ],
            Channel::LoadBalancing => &[
                kinds::BACKEND_HEALTH,
                kinds::BACKEND_METRICS,
                kinds::LOAD_DISTRIBUTION,
                kinds::HEALTH_CHECK,
            ],
            Channel::KnowledgeProgress => &[
                kinds::KNOWLEDGE_PROGRESS,
                kinds::PHASE_COMPLETE,
                kinds::ITEM_PROCESSED,
            ],
            Channel::KnowledgeItems => &[
                kinds::ITEM_CREATED,
                kinds::ITEM_UPDATED,
                kinds::ITEM_DELETED,
                kinds::ITEM_REPROCESSED,
            ],
            Channel::KnowledgeSearch => &[kinds::SEARCH_RESULTS, kinds::SEARCH_SUGGESTIONS],
        }
    }

    /// Query parameters the channel's filter recognizes.
    pub fn filter_keys(self) -> &'static [&'static str] {
        match self {
            Channel::Logs => &["agent_id", "task_id", "level"],
            Channel::Tasks => &["task_id", "agent_id"],
            Channel::Notifications => &["agent_id"],
            Channel::Workflows => &["workflow_id", "status"],
            Channel::Integrations => &["event_type", "source"],
            Channel::LoadBalancing => &["backend_id", "metric_type"],
            Channel::KnowledgeProgress => &["item_id", "phase"],
            Channel::KnowledgeItems => &["category"],
            Channel::KnowledgeSearch => &["query", "search_type"],
        }
    }

    /// Builds the endpoint from untyped `key=value` filters, rejecting keys
    /// the channel does not recognize.
    pub fn endpoint_with(self, filters: &[(String, String)]) -> Result<Endpoint> {
        let valid = self.filter_keys();
        let mut endpoint = Endpoint::new(self.endpoint_name());
        for (key, value) in filters {
            if !valid.contains(&key.as_str()) {
                return Err(Error::UnknownFilter {
                    channel: self.name().to_string(),
                    key: key.clone(),
                    valid: valid.join(", "),
                });
            }
            endpoint = endpoint.param(key, value);
        }
        Ok(endpoint)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::UnknownChannel(s.to_string()))
    }
}

/// A typed filter for one channel.
pub trait ChannelFilter {
    /// Channel the filter applies to.
    const CHANNEL: Channel;

    /// Query parameters in wire order; `None` values are omitted.
    fn params(&self) -> Vec<(&'static str, Option<&str>)>;

    /// Endpoint carrying this filter.
    fn endpoint(&self) -> Endpoint {
        self.params()
            .into_iter()
            .fold(Endpoint::new(Self::CHANNEL.endpoint_name()), |ep, (key, value)| {
                ep.param_opt(key, value)
            })
    }
}

macro_rules! channel_filter {
    ($(#[$meta:meta])* $name:ident => $channel:expr, { $($field:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: Option<String>,)*
        }

        impl ChannelFilter for $name {
            const CHANNEL: Channel = $channel;

            fn params(&self) -> Vec<(&'static str, Option<&str>)> {
                vec![$((stringify!($field), self.$field.as_deref()),)*]
            }
        }
    };
}

channel_filter!(
    /// Log stream filter.
    LogFilter => Channel::Logs, { agent_id, task_id, level }
);
channel_filter!(
    /// Task progress filter.
    TaskFilter => Channel::Tasks, { task_id, agent_id }
);
channel_filter!(
    /// Notification filter.
    NotificationFilter => Channel::Notifications, { agent_id }
);
channel_filter!(
    /// Workflow status filter.
    WorkflowFilter => Channel::Workflows, { workflow_id, status }
);
channel_filter!(
    /// Integration event filter.
    IntegrationFilter => Channel::Integrations, { event_type, source }
);
channel_filter!(
    /// Load balancing metrics filter.
    LoadBalancingFilter => Channel::LoadBalancing, { backend_id, metric_type }
);
channel_filter!(
    /// Knowledge processing progress filter.
    KnowledgeProgressFilter => Channel::KnowledgeProgress, { item_id, phase }
);
channel_filter!(
    /// Knowledge item change filter.
    KnowledgeItemsFilter => Channel::KnowledgeItems, { category }
);
channel_filter!(
    /// Knowledge search filter.
    KnowledgeSearchFilter => Channel::KnowledgeSearch, { query, search_type }
);

/// Callback for channel events: receives the event type and its payload.
pub type ChannelListener = Arc<dyn Fn(&str, &Value) -> ListenerResult + Send + Sync>;

/// Live registration of one channel's listeners.
#[must_use = "dropping a Subscription keeps its listeners registered; call unsubscribe"]
pub struct Subscription<T: Transport + 'static = WebSocketTransport> {
    manager: ConnectionManager<T>,
    channel: Channel,
    endpoint: Endpoint,
    outcome: ConnectOutcome,
    listeners: Vec<(&'static str, ListenerId)>,
}

impl<T: Transport + 'static> Subscription<T> {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Endpoint derived from the filter.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Whether this subscription opened the connection or shared one.
    pub fn outcome(&self) -> &ConnectOutcome {
        &self.outcome
    }

    pub fn is_active(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Removes this subscription's listeners. Idempotent.
    pub fn unsubscribe(&mut self) {
        for (kind, id) in std::mem::take(&mut self.listeners) {
            self.manager.remove_listener(kind, id);
        }
        debug!(channel = %self.channel, "unsubscribed");
    }
}

impl<T: Transport + 'static> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("endpoint", &self.endpoint)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Subscription entry points bound to a manager and auth token.
pub struct Channels<T: Transport + 'static = WebSocketTransport> {
    manager: ConnectionManager<T>,
    token: Option<String>,
}

impl<T: Transport + 'static> Channels<T> {
    pub fn new(manager: ConnectionManager<T>, token: Option<String>) -> Self {
        Channels { manager, token }
    }

    pub fn manager(&self) -> &ConnectionManager<T> {
        &self.manager
    }

    /// Subscribes with a typed filter.
    pub fn subscribe<F, L>(&self, filter: &F, listener: L) -> Result<Subscription<T>>
    where
        F: ChannelFilter,
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe_endpoint(F::CHANNEL, filter.endpoint(), Arc::new(listener))
    }

    /// Subscribes with untyped `key=value` filters.
    pub fn subscribe_raw<L>(
        &self,
        channel: Channel,
        filters: &[(String, String)],
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        let endpoint = channel.endpoint_with(filters)?;
        self.subscribe_endpoint(channel, endpoint, Arc::new(listener))
    }

    pub fn subscribe_logs<L>(&self, filter: &LogFilter, listener: L) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_tasks<L>(&self, filter: &TaskFilter, listener: L) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_notifications<L>(
        &self,
        filter: &NotificationFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_workflows<L>(
        &self,
        filter: &WorkflowFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_integrations<L>(
        &self,
        filter: &IntegrationFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_load_balancing<L>(
        &self,
        filter: &LoadBalancingFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_knowledge_progress<L>(
        &self,
        filter: &KnowledgeProgressFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_knowledge_items<L>(
        &self,
        filter: &KnowledgeItemsFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    pub fn subscribe_knowledge_search<L>(
        &self,
        filter: &KnowledgeSearchFilter,
        listener: L,
    ) -> Result<Subscription<T>>
    where
        L: Fn(&str, &Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe(filter, listener)
    }

    fn subscribe_endpoint(
        &self,
        channel: Channel,
        endpoint: Endpoint,
        listener: ChannelListener,
    ) -> Result<Subscription<T>> {
        let outcome = self.manager.connect(&endpoint, self.token.as_deref())?;
        let listeners = channel
            .event_kinds()
            .iter()
            .map(|&kind| {
                let listener = Arc::clone(&listener);
                let id = self
                    .manager
                    .add_listener(kind, move |data| listener(kind, data));
                (kind, id)
            })
            .collect();
        debug!(channel = %channel, endpoint = %endpoint, "subscribed");
        Ok(Subscription {
            manager: self.manager.clone(),
            channel,
            endpoint,
            outcome,
            listeners,
        })
    }
}

#[cfg(test)]
#[path = "channels_tests.rs"]
mod tests;
