use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::Deserialize;

use crate::client::{Collection, ResultsClient};
use crate::subscription::Subscription;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct Listener {
    pub collection: Collection,
    pub subscription: Subscription,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub client: Option<ResultsClient>,
    pub listeners: HashMap<String, Listener>,
    pub auth_watch: Option<Subscription>,
    /// Pushed event lines, flushed by the main loop before each response.
    pub events: Sender<serde_json::Value>,
}

impl AppState {
    pub fn new() -> (Self, Receiver<serde_json::Value>) {
        let (tx, rx) = mpsc::channel();
        let state = Self {
            workspace: None,
            client: None,
            listeners: HashMap::new(),
            auth_watch: None,
            events: tx,
        };
        (state, rx)
    }

    /// Drops live subscriptions and disposes the client, if any.
    pub fn close_workspace(&mut self) {
        self.listeners.clear();
        self.auth_watch = None;
        if let Some(client) = self.client.take() {
            client.dispose();
        }
        self.workspace = None;
    }
}
