//! Actor context: who audit entries are attributed to.
//!
//! One writer (held by the auth gate) and any number of readers (loggers).
//! Readers always observe the latest value at the moment they read it.

use tokio::sync::watch;

use malldir_core::IdentityId;

/// Actor recorded when nobody is signed in.
pub const ANONYMOUS: &str = "anonymous";

/// Create a linked writer/reader pair, starting anonymous.
pub fn actor_context() -> (ActorWriter, ActorContext) {
    let (tx, rx) = watch::channel(None);
    (ActorWriter { tx }, ActorContext { rx })
}

/// The single write end of the actor context.
#[derive(Debug)]
pub struct ActorWriter {
    tx: watch::Sender<Option<IdentityId>>,
}

impl ActorWriter {
    pub fn set(&self, actor: IdentityId) {
        self.tx.send_replace(Some(actor));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Another reader of this context.
    pub fn context(&self) -> ActorContext {
        ActorContext {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read end of the actor context; cheap to clone.
#[derive(Debug, Clone)]
pub struct ActorContext {
    rx: watch::Receiver<Option<IdentityId>>,
}

impl ActorContext {
    /// A context with no writer; always anonymous.
    pub fn anonymous() -> Self {
        actor_context().1
    }

    pub fn current(&self) -> Option<IdentityId> {
        self.rx.borrow().clone()
    }

    /// Identity id, or `"anonymous"`.
    pub fn actor_id(&self) -> String {
        self.rx
            .borrow()
            .as_ref()
            .map_or_else(|| ANONYMOUS.to_string(), |id| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_every_write() {
        let (writer, ctx) = actor_context();
        let other = writer.context();
        assert_eq!(ctx.actor_id(), ANONYMOUS);

        writer.set(IdentityId::new("uid-7"));
        assert_eq!(ctx.actor_id(), "uid-7");
        assert_eq!(other.current(), Some(IdentityId::new("uid-7")));

        writer.clear();
        assert_eq!(ctx.actor_id(), ANONYMOUS);
        assert_eq!(other.current(), None);
    }

    #[test]
    fn detached_context_stays_anonymous() {
        assert_eq!(ActorContext::anonymous().actor_id(), ANONYMOUS);
    }
}
