#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use vizkit_ui::{Fetch, FetchError, FetchResponse, MemoryDom, NodeId};

pub const GANTT_PAYLOAD: &str = r##"[
    {"label": "Design", "category": "plan", "start": "2024-03-01", "end": "2024-03-10", "color": "#4c78a8"},
    {"label": "Build", "category": "dev", "start": "2024-03-08", "end": "2024-04-02", "color": "#f58518"},
    {"label": "Ship", "category": "ops", "start": "2024-04-02T09:00:00Z", "end": "2024-04-03T17:00:00Z"}
]"##;

pub const STACKED_PAYLOAD: &str = r##"[
    {"label": "A", "category": "x", "value": 10, "color": "#1f77b4", "description": "first"},
    {"label": "A", "category": "y", "value": 20, "color": "#ff7f0e", "description": "second"},
    {"label": "B", "category": "x", "value": 10, "color": "#1f77b4"}
]"##;

enum Reply {
    Body(u16, String),
    Gate(oneshot::Receiver<(u16, String)>),
    Transport(String),
}

#[derive(Default)]
struct Script {
    urls: Vec<String>,
    replies: VecDeque<Reply>,
}

/// Answers requests from a queue of scripted replies; an empty queue answers `[]`.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    script: Rc<RefCell<Script>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.script
            .borrow_mut()
            .replies
            .push_back(Reply::Body(status, body.to_string()));
        self
    }

    /// Next request stays pending until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<(u16, String)> {
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().replies.push_back(Reply::Gate(rx));
        tx
    }

    pub fn fail(&self, reason: &str) {
        self.script
            .borrow_mut()
            .replies
            .push_back(Reply::Transport(reason.to_string()));
    }

    pub fn urls(&self) -> Vec<String> {
        self.script.borrow().urls.clone()
    }
}

impl Fetch for ScriptedFetcher {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        let reply = {
            let mut script = self.script.borrow_mut();
            script.urls.push(url.to_string());
            script.replies.pop_front()
        };
        let url = url.to_string();
        async move {
            match reply {
                None => Ok(FetchResponse::ok("[]")),
                Some(Reply::Body(status, body)) => Ok(FetchResponse { status, body }),
                Some(Reply::Gate(rx)) => {
                    let (status, body) = rx.await.map_err(|_| FetchError::Transport {
                        url,
                        reason: "gate dropped".to_string(),
                    })?;
                    Ok(FetchResponse { status, body })
                }
                Some(Reply::Transport(reason)) => Err(FetchError::Transport { url, reason }),
            }
        }
        .boxed_local()
    }
}

pub fn marks(dom: &MemoryDom, host: NodeId) -> Vec<NodeId> {
    dom.find_by_class(host, "vizkit-mark")
}

pub fn mark_with_index(dom: &MemoryDom, host: NodeId, index: usize) -> NodeId {
    let index = index.to_string();
    marks(dom, host)
        .into_iter()
        .find(|mark| dom.attribute(*mark, "data-index").as_deref() == Some(index.as_str()))
        .expect("mark with data-index")
}

pub fn overlays(dom: &MemoryDom, class: &str) -> Vec<NodeId> {
    dom.find_by_class(dom.body_id(), class)
}

/// The svg inside the scrollable data region.
pub fn data_surface(dom: &MemoryDom, host: NodeId) -> NodeId {
    let region = dom.find_by_class(host, "vizkit-data-region")[0];
    dom.children(region)[0]
}
