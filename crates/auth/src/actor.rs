//! Actor identity: who a change is attributed to in the audit trail.
//!
//! Resolution never fails. Anything that prevents identifying a human caller
//! (no principal, anonymous or blank subject, a broken context) yields
//! [`ActorId::SYSTEM`].

use thiserror::Error;
use uuid::Uuid;

use backoffice_core::ActorId;

use crate::principal::ANONYMOUS_SUBJECT;
use crate::Principal;

/// Namespace for actor ids derived from non-UUID subjects.
const SUBJECT_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_42a0_9c3e_5d17_a8e4_0c2b_7f91_d35e);

/// Failure while inspecting the current security context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("security context unavailable: {0}")]
pub struct PrincipalSourceError(pub String);

/// Where the current principal comes from (request extension, task-local, ...).
pub trait PrincipalSource {
    fn current(&self) -> Result<Option<Principal>, PrincipalSourceError>;
}

impl PrincipalSource for Principal {
    fn current(&self) -> Result<Option<Principal>, PrincipalSourceError> {
        Ok(Some(self.clone()))
    }
}

impl PrincipalSource for Option<Principal> {
    fn current(&self) -> Result<Option<Principal>, PrincipalSourceError> {
        Ok(self.clone())
    }
}

/// Anything that can name the actor of the current change.
pub trait ResolveActor {
    fn resolve_actor(&self) -> ActorId;
}

impl ResolveActor for ActorId {
    fn resolve_actor(&self) -> ActorId {
        *self
    }
}

/// Actor identity service over a principal source.
#[derive(Debug, Clone)]
pub struct ActorResolver<S> {
    source: S,
}

impl<S: PrincipalSource> ActorResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: PrincipalSource> ResolveActor for ActorResolver<S> {
    fn resolve_actor(&self) -> ActorId {
        match self.source.current() {
            Ok(principal) => actor_for(principal.as_ref()),
            Err(err) => {
                tracing::warn!(error = %err, "actor resolution failed; attributing to system");
                ActorId::SYSTEM
            }
        }
    }
}

/// Map a principal to its audit identity.
pub fn actor_for(principal: Option<&Principal>) -> ActorId {
    let Some(principal) = principal else {
        return ActorId::SYSTEM;
    };
    if !principal.is_authenticated() {
        return ActorId::SYSTEM;
    }

    let subject = principal.subject_id().trim();
    if subject.is_empty() || subject == ANONYMOUS_SUBJECT {
        return ActorId::SYSTEM;
    }

    match Uuid::parse_str(subject) {
        Ok(uuid) => ActorId::from_uuid(uuid),
        Err(_) => derived_actor(subject),
    }
}

/// Stable, content-addressed actor id for an opaque subject.
pub fn derived_actor(subject: &str) -> ActorId {
    ActorId::from_uuid(Uuid::new_v5(&SUBJECT_NAMESPACE, subject.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn missing_or_unauthenticated_principal_is_system() {
        assert_eq!(actor_for(None), ActorId::SYSTEM);
        assert_eq!(actor_for(Some(&Principal::unauthenticated())), ActorId::SYSTEM);
    }

    #[test]
    fn anonymous_and_blank_subjects_are_system() {
        assert_eq!(actor_for(Some(&Principal::anonymous())), ActorId::SYSTEM);
        let blank = Principal::authenticated("   ", [Role::CONSUMER]);
        assert_eq!(actor_for(Some(&blank)), ActorId::SYSTEM);
    }

    #[test]
    fn uuid_subject_is_used_verbatim() {
        let id = Uuid::now_v7();
        let principal = Principal::authenticated(id.to_string(), []);
        assert_eq!(actor_for(Some(&principal)), ActorId::from_uuid(id));
    }

    #[test]
    fn opaque_subject_derives_a_name_based_uuid() {
        let principal = Principal::authenticated("jane@example.com", []);
        let actor = actor_for(Some(&principal));
        assert!(!actor.is_system());
        assert_eq!(actor.as_uuid().get_version_num(), 5);
        assert_ne!(actor, derived_actor("john@example.com"));
    }

    #[test]
    fn failing_source_falls_back_to_system() {
        struct TornDown;

        impl PrincipalSource for TornDown {
            fn current(&self) -> Result<Option<Principal>, PrincipalSourceError> {
                Err(PrincipalSourceError("context torn down".to_string()))
            }
        }

        let resolver = ActorResolver::new(TornDown);
        assert_eq!(resolver.resolve_actor(), ActorId::SYSTEM);
    }

    #[test]
    fn resolver_reads_the_source() {
        let id = Uuid::now_v7();
        let resolver = ActorResolver::new(Principal::authenticated(id.to_string(), []));
        assert_eq!(resolver.resolve_actor(), ActorId::from_uuid(id));
        assert_eq!(ActorResolver::new(None::<Principal>).resolve_actor(), ActorId::SYSTEM);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the same external identity always audits to the same actor.
            #[test]
            fn derivation_is_deterministic(subject in "[a-z0-9|@._-]{1,40}") {
                prop_assume!(Uuid::parse_str(&subject).is_err());
                prop_assume!(subject != ANONYMOUS_SUBJECT);

                let principal = Principal::authenticated(subject.clone(), []);
                let first = actor_for(Some(&principal));
                let second = actor_for(Some(&principal));
                prop_assert_eq!(first, second);
                prop_assert_eq!(first, derived_actor(&subject));
                prop_assert!(!first.is_system());
            }

            /// Property: UUID subjects round-trip exactly.
            #[test]
            fn uuid_subjects_are_preserved(raw in any::<u128>()) {
                let id = Uuid::from_u128(raw);
                prop_assume!(!id.is_nil());
                let principal = Principal::authenticated(id.to_string(), []);
                prop_assert_eq!(actor_for(Some(&principal)), ActorId::from_uuid(id));
            }
        }
    }
}
