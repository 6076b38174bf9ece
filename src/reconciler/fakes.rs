// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory test doubles for the reconciler seams.

use crate::errors::KumaError;
use crate::ingress::IngressSource;
use crate::kuma::{Monitor, MonitorId, MonitorTag, MonitoringService, NewMonitor, Tag, TagId};
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::{Ingress, IngressRule, IngressSpec};
use kube::api::ObjectMeta;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// Build an ingress named `name` with one rule per host and the given annotations.
pub fn ingress(name: &str, hosts: &[&str], annotations: &[(&str, &str)]) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            annotations: if annotations.is_empty() {
                None
            } else {
                Some(
                    annotations
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect::<BTreeMap<_, _>>(),
                )
            },
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(
                hosts
                    .iter()
                    .map(|host| IngressRule {
                        host: Some((*host).to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeIngressSource {
    ingresses: Mutex<Vec<Ingress>>,
    fail: Mutex<bool>,
}

impl FakeIngressSource {
    pub fn new(ingresses: Vec<Ingress>) -> Self {
        Self {
            ingresses: Mutex::new(ingresses),
            fail: Mutex::new(false),
        }
    }

    pub fn set(&self, ingresses: Vec<Ingress>) {
        *self.ingresses.lock().unwrap() = ingresses;
    }

    pub fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl IngressSource for FakeIngressSource {
    async fn list_ingresses(&self) -> anyhow::Result<Vec<Ingress>> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("cluster unreachable");
        }
        Ok(self.ingresses.lock().unwrap().clone())
    }
}

/// Every call the reconciler makes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    ListTags,
    CreateTag(String),
    ListMonitors,
    CreateMonitor(String),
    AddMonitorTag(TagId, MonitorId),
    DeleteMonitor(MonitorId),
    Disconnect,
}

#[derive(Default)]
struct State {
    tags: Vec<Tag>,
    monitors: Vec<Monitor>,
    next_id: u64,
    calls: Vec<Call>,
    failing_deletes: HashSet<MonitorId>,
    fail_login: bool,
    fail_list_monitors: bool,
    fail_create: bool,
    fail_tagging: bool,
    fail_disconnect: bool,
}

/// An Uptime Kuma stand-in keeping tags and monitors in memory.
pub struct FakeMonitoringService {
    state: Mutex<State>,
}

impl Default for FakeMonitoringService {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        }
    }
}

fn injected(operation: &str) -> KumaError {
    KumaError::Http {
        method: operation.to_string(),
        url: "fake://kuma".to_string(),
        status: 500,
        body: "injected failure".to_string(),
    }
}

impl FakeMonitoringService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(self, id: TagId, name: &str) -> Self {
        self.state.lock().unwrap().tags.push(Tag {
            id,
            name: name.to_string(),
            color: "green".to_string(),
        });
        self
    }

    /// Seed a monitor carrying the given tag names.
    pub fn with_monitor(self, id: MonitorId, url: &str, tags: &[&str]) -> Self {
        self.state.lock().unwrap().monitors.push(Monitor {
            id,
            name: crate::reconciler::diff::canonical_host(url).to_string(),
            url: url.to_string(),
            tags: tags.iter().map(|t| MonitorTag::named(*t)).collect(),
        });
        self
    }

    pub fn fail_delete(&self, id: MonitorId) {
        self.state.lock().unwrap().failing_deletes.insert(id);
    }

    pub fn fail_login(&self) {
        self.state.lock().unwrap().fail_login = true;
    }

    pub fn fail_list_monitors(&self) {
        self.state.lock().unwrap().fail_list_monitors = true;
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_tagging(&self) {
        self.state.lock().unwrap().fail_tagging = true;
    }

    pub fn fail_disconnect(&self) {
        self.state.lock().unwrap().fail_disconnect = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn monitors(&self) -> Vec<Monitor> {
        self.state.lock().unwrap().monitors.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.lock().unwrap().tags.clone()
    }

    /// Calls that change state on the service.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::CreateTag(_)
                        | Call::CreateMonitor(_)
                        | Call::AddMonitorTag(..)
                        | Call::DeleteMonitor(_)
                )
            })
            .collect()
    }
}

#[async_trait]
impl MonitoringService for FakeMonitoringService {
    async fn login(&self) -> Result<(), KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Login);
        if state.fail_login {
            return Err(KumaError::AuthenticationFailed {
                username: "admin".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListTags);
        Ok(state.tags.clone())
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateTag(name.to_string()));
        state.next_id += 1;
        let tag = Tag {
            id: state.next_id,
            name: name.to_string(),
            color: color.to_string(),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListMonitors);
        if state.fail_list_monitors {
            return Err(injected("GET"));
        }
        Ok(state.monitors.clone())
    }

    async fn create_monitor(&self, monitor: &NewMonitor) -> Result<MonitorId, KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateMonitor(monitor.url.clone()));
        if state.fail_create {
            return Err(injected("POST"));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.monitors.push(Monitor {
            id,
            name: monitor.name.clone(),
            url: monitor.url.clone(),
            tags: Vec::new(),
        });
        Ok(id)
    }

    async fn add_monitor_tag(&self, tag_id: TagId, monitor_id: MonitorId) -> Result<(), KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::AddMonitorTag(tag_id, monitor_id));
        if state.fail_tagging {
            return Err(injected("POST"));
        }
        let name = state
            .tags
            .iter()
            .find(|t| t.id == tag_id)
            .map(|t| t.name.clone())
            .ok_or_else(|| injected("POST"))?;
        let monitor = state
            .monitors
            .iter_mut()
            .find(|m| m.id == monitor_id)
            .ok_or_else(|| injected("POST"))?;
        monitor.tags.push(MonitorTag {
            tag_id: Some(tag_id),
            name,
            color: None,
            value: Some(String::new()),
        });
        Ok(())
    }

    async fn delete_monitor(&self, monitor_id: MonitorId) -> Result<(), KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteMonitor(monitor_id));
        if state.failing_deletes.contains(&monitor_id) {
            return Err(injected("DELETE"));
        }
        state.monitors.retain(|m| m.id != monitor_id);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), KumaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Disconnect);
        if state.fail_disconnect {
            return Err(injected("DISCONNECT"));
        }
        Ok(())
    }
}
