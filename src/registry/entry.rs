//! Tunnel entry types
//!
//! This module defines the per-tunnel state stored in the registry.

use std::collections::{HashMap, VecDeque};

use super::config::RegistryConfig;
use super::key::DEFAULT_SUBCHANNEL;

/// State of a single tunnel in the registry
#[derive(Debug)]
pub struct Tunnel {
    /// Tunnel ID, fixed at creation
    id: String,

    /// Last published content per subchannel
    subchannels: HashMap<String, String>,

    /// Every value published to the default subchannel, oldest first
    history: VecDeque<String>,

    /// History cap (`None` = unbounded)
    history_limit: Option<usize>,

    /// Number of accepted publishes across all subchannels
    publish_count: u64,
}

impl Tunnel {
    /// Create an empty tunnel
    pub(super) fn new(id: String, config: &RegistryConfig) -> Self {
        Self {
            id,
            subchannels: HashMap::new(),
            history: VecDeque::new(),
            history_limit: config.history_limit,
            publish_count: 0,
        }
    }

    /// Record a publish
    ///
    /// Replaces the subchannel's content and, for the default subchannel,
    /// appends to history (evicting the oldest entry when the cap is hit).
    pub(super) fn record(&mut self, subchannel: &str, content: &str) {
        self.subchannels
            .insert(subchannel.to_string(), content.to_string());

        if subchannel == DEFAULT_SUBCHANNEL {
            self.push_history(content);
        }
        self.publish_count += 1;
    }

    fn push_history(&mut self, content: &str) {
        match self.history_limit {
            Some(0) => {}
            Some(limit) => {
                while self.history.len() >= limit {
                    self.history.pop_front();
                }
                self.history.push_back(content.to_string());
            }
            None => self.history.push_back(content.to_string()),
        }
    }

    /// Last content published to a subchannel
    pub fn content(&self, subchannel: &str) -> Option<&str> {
        self.subchannels.get(subchannel).map(String::as_str)
    }

    /// Copy of the history, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    /// Owned point-in-time copy of this tunnel
    pub fn snapshot(&self) -> TunnelSnapshot {
        TunnelSnapshot {
            id: self.id.clone(),
            subchannels: self.subchannels.clone(),
            history: self.messages(),
            publish_count: self.publish_count,
        }
    }
}

/// Owned copy of a tunnel's state, returned by lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSnapshot {
    /// Tunnel ID
    pub id: String,
    /// Last content per subchannel
    pub subchannels: HashMap<String, String>,
    /// Default-subchannel history, oldest first
    pub history: Vec<String>,
    /// Accepted publishes across all subchannels
    pub publish_count: u64,
}

impl TunnelSnapshot {
    /// Last content of a subchannel, if any was published
    pub fn content(&self, subchannel: &str) -> Option<&str> {
        self.subchannels.get(subchannel).map(String::as_str)
    }
}
