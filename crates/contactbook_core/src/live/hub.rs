//! Single-threaded snapshot dispatcher.
//!
//! # Invariants
//! - One dispatcher thread owns every subscriber list and the latest
//!   snapshot of each kind; all state changes arrive as messages.
//! - A new subscriber's first message is the latest snapshot.
//! - Dropped subscriptions are pruned on the next delivery.

use crate::live::{MutationFailure, Snapshot, Subscription};
use crate::model::contact::Contact;
use crate::model::group::Group;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info};
use std::io;
use std::thread::{self, JoinHandle};

pub(crate) enum HubMessage {
    Contacts(Snapshot<Contact>),
    Groups(Snapshot<Group>),
    Failure(MutationFailure),
    SubscribeContacts(Sender<Snapshot<Contact>>),
    SubscribeGroups(Sender<Snapshot<Group>>),
    SubscribeFailures(Sender<MutationFailure>),
    /// Replies once every earlier message has been dispatched.
    Barrier(Sender<()>),
}

/// Cloneable sending side used by mutation workers.
#[derive(Clone)]
pub(crate) struct Publisher {
    sender: Sender<HubMessage>,
}

impl Publisher {
    pub(crate) fn contacts(&self, snapshot: Vec<Contact>) {
        self.send(HubMessage::Contacts(Snapshot::new(snapshot)));
    }

    pub(crate) fn groups(&self, snapshot: Vec<Group>) {
        self.send(HubMessage::Groups(Snapshot::new(snapshot)));
    }

    pub(crate) fn failure(&self, failure: MutationFailure) {
        self.send(HubMessage::Failure(failure));
    }

    pub(crate) fn barrier(&self, reply: Sender<()>) {
        self.send(HubMessage::Barrier(reply));
    }

    fn send(&self, message: HubMessage) {
        if self.sender.send(message).is_err() {
            debug!("event=hub_publish module=live status=skipped reason=dispatcher_stopped");
        }
    }
}

/// Owner of the dispatcher thread.
///
/// Dropping the hub closes its channel and joins the dispatcher once every
/// cloned `Publisher` is gone as well.
pub(crate) struct Hub {
    sender: Option<Sender<HubMessage>>,
    handle: Option<JoinHandle<()>>,
}

impl Hub {
    pub(crate) fn start(contacts: Vec<Contact>, groups: Vec<Group>) -> io::Result<Self> {
        let (sender, receiver) = unbounded();
        let state = DispatchState {
            contacts: Snapshot::new(contacts),
            groups: Snapshot::new(groups),
            contact_subscribers: Vec::new(),
            group_subscribers: Vec::new(),
            failure_subscribers: Vec::new(),
        };
        let handle = thread::Builder::new()
            .name("contactbook-hub".to_string())
            .spawn(move || run_dispatcher(receiver, state))?;

        info!("event=hub_start module=live status=ok");
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub(crate) fn publisher(&self) -> Publisher {
        Publisher {
            sender: self.sender().clone(),
        }
    }

    pub(crate) fn subscribe_contacts(&self) -> Subscription<Snapshot<Contact>> {
        self.register(HubMessage::SubscribeContacts)
    }

    pub(crate) fn subscribe_groups(&self) -> Subscription<Snapshot<Group>> {
        self.register(HubMessage::SubscribeGroups)
    }

    pub(crate) fn subscribe_failures(&self) -> Subscription<MutationFailure> {
        self.register(HubMessage::SubscribeFailures)
    }

    fn register<M>(&self, wrap: impl FnOnce(Sender<M>) -> HubMessage) -> Subscription<M> {
        let (sender, receiver) = unbounded();
        // A stopped dispatcher drops `sender`, so the subscription reads as closed.
        let _ = self.sender().send(wrap(sender));
        Subscription::new(receiver)
    }

    fn sender(&self) -> &Sender<HubMessage> {
        match &self.sender {
            Some(sender) => sender,
            None => unreachable!("hub sender is only taken in drop"),
        }
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct DispatchState {
    contacts: Snapshot<Contact>,
    groups: Snapshot<Group>,
    contact_subscribers: Vec<Sender<Snapshot<Contact>>>,
    group_subscribers: Vec<Sender<Snapshot<Group>>>,
    failure_subscribers: Vec<Sender<MutationFailure>>,
}

impl DispatchState {
    fn handle(&mut self, message: HubMessage) {
        match message {
            HubMessage::Contacts(snapshot) => {
                self.contacts = snapshot;
                broadcast(&mut self.contact_subscribers, &self.contacts);
            }
            HubMessage::Groups(snapshot) => {
                self.groups = snapshot;
                broadcast(&mut self.group_subscribers, &self.groups);
            }
            HubMessage::Failure(failure) => {
                broadcast(&mut self.failure_subscribers, &failure);
            }
            HubMessage::SubscribeContacts(subscriber) => {
                if subscriber.send(Snapshot::clone(&self.contacts)).is_ok() {
                    self.contact_subscribers.push(subscriber);
                }
            }
            HubMessage::SubscribeGroups(subscriber) => {
                if subscriber.send(Snapshot::clone(&self.groups)).is_ok() {
                    self.group_subscribers.push(subscriber);
                }
            }
            HubMessage::SubscribeFailures(subscriber) => {
                self.failure_subscribers.push(subscriber);
            }
            HubMessage::Barrier(reply) => {
                let _ = reply.send(());
            }
        }
    }
}

fn broadcast<M: Clone>(subscribers: &mut Vec<Sender<M>>, message: &M) {
    subscribers.retain(|subscriber| subscriber.send(message.clone()).is_ok());
}

fn run_dispatcher(receiver: Receiver<HubMessage>, mut state: DispatchState) {
    for message in receiver.iter() {
        state.handle(message);
    }
    info!(
        "event=hub_stop module=live status=ok contact_subscribers={} group_subscribers={}",
        state.contact_subscribers.len(),
        state.group_subscribers.len()
    );
}
