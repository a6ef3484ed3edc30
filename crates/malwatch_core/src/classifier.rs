//! Watcher classification heuristic.
//!
//! # Responsibility
//! - Decide whether an account watching a suspicious account is a human or a
//!   throwaway bot-like account.
//!
//! # Invariants
//! - Pure and deterministic: the outcome depends only on the inputs.
//! - An account never classifies itself.
//!
//! The signal is coarse. Throwaway accounts observed so far have all-lowercase
//! logins and an empty profile; anything else is treated as human-curated.
//! Misclassification at the margins is accepted.

use crate::model::event::ActorProfile;

/// Outcome of classifying one watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Nothing to record: no login, or the account watched itself.
    Skip,
    /// Looks like a real person; must not be tracked.
    Legitimate,
    /// Looks like a bot; added to the frontier.
    Suspicious,
}

/// Classifies a watcher observed on `self_login`'s activity.
pub fn classify(
    actor_login: Option<&str>,
    self_login: &str,
    profile: &ActorProfile,
) -> Classification {
    let login = match actor_login {
        Some(login) if !login.is_empty() && login != self_login => login,
        _ => return Classification::Skip,
    };

    if login != login.to_lowercase() || profile.has_profile_details() {
        return Classification::Legitimate;
    }

    Classification::Suspicious
}

/// Classifies an event actor snapshot, reading the login from the snapshot.
pub fn classify_actor(actor: &ActorProfile, self_login: &str) -> Classification {
    classify(actor.login.as_deref(), self_login, actor)
}

#[cfg(test)]
mod tests {
    use super::{classify, classify_actor, Classification};
    use crate::model::event::ActorProfile;

    #[test]
    fn self_watch_is_skipped_regardless_of_profile() {
        let mut profile = ActorProfile::with_login("lazysmock");
        assert_eq!(
            classify(Some("lazysmock"), "lazysmock", &profile),
            Classification::Skip
        );

        profile.company = Some("ACME".to_string());
        assert_eq!(
            classify(Some("lazysmock"), "lazysmock", &profile),
            Classification::Skip
        );
    }

    #[test]
    fn missing_login_is_skipped() {
        assert_eq!(
            classify(None, "bar", &ActorProfile::default()),
            Classification::Skip
        );
        assert_eq!(
            classify(Some(""), "bar", &ActorProfile::default()),
            Classification::Skip
        );
    }

    #[test]
    fn mixed_case_login_is_legitimate() {
        assert_eq!(
            classify(Some("Foo"), "bar", &ActorProfile::default()),
            Classification::Legitimate
        );
    }

    #[test]
    fn any_profile_detail_is_legitimate() {
        let details: [fn(&mut ActorProfile); 5] = [
            |p| p.company = Some("ACME".to_string()),
            |p| p.bio = Some("hi".to_string()),
            |p| p.location = Some("Berlin".to_string()),
            |p| p.email = Some("foo@example.com".to_string()),
            |p| p.blog = Some("https://foo.dev".to_string()),
        ];

        for fill in details {
            let mut profile = ActorProfile::with_login("foo");
            fill(&mut profile);
            assert_eq!(
                classify(Some("foo"), "bar", &profile),
                Classification::Legitimate,
                "profile {profile:?} should be legitimate"
            );
        }
    }

    #[test]
    fn lowercase_login_without_details_is_suspicious() {
        let mut profile = ActorProfile::with_login("foo");
        profile.bio = Some(String::new());
        assert_eq!(
            classify(Some("foo"), "bar", &profile),
            Classification::Suspicious
        );
    }

    #[test]
    fn classify_actor_reads_login_from_snapshot() {
        assert_eq!(
            classify_actor(&ActorProfile::with_login("zzz"), "a"),
            Classification::Suspicious
        );
        assert_eq!(
            classify_actor(&ActorProfile::default(), "a"),
            Classification::Skip
        );
    }
}
