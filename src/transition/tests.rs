//! Transition Module Tests
//!
//! Validates the sanity check run on incoming transition messages.

#[cfg(test)]
mod tests {
    use crate::transition::{TransitionMessage, TransitionValidator};
    use tracing::Span;

    fn offline_to_slave() -> TransitionMessage {
        TransitionMessage::new("OFFLINE", "SLAVE", "p2p1", "p2p1_1")
    }

    #[test]
    fn test_validate_accepts_exact_match() {
        let validator = TransitionValidator::new(Span::none());
        assert!(validator.validate("OFFLINE", "SLAVE", &offline_to_slave(), "p2p1", "p2p1_1"));
    }

    #[test]
    fn test_validate_ignores_case() {
        let validator = TransitionValidator::new(Span::none());
        assert!(validator.validate("offline", "Slave", &offline_to_slave(), "P2P1", "P2p1_1"));
    }

    #[test]
    fn test_validate_ignores_case_of_non_ascii_letters() {
        let validator = TransitionValidator::new(Span::none());
        let message = TransitionMessage::new("OFFLINE", "SLAVE", "Ünits", "Ünits_1");

        assert!(validator.validate("offline", "slave", &message, "ünits", "ünits_1"));
        assert!(!validator.validate("offline", "slave", &message, "units", "units_1"));
    }

    #[test]
    fn test_validate_rejects_any_single_mismatch() {
        let validator = TransitionValidator::new(Span::none());
        let message = offline_to_slave();

        assert!(!validator.validate("SLAVE", "SLAVE", &message, "p2p1", "p2p1_1"));
        assert!(!validator.validate("OFFLINE", "MASTER", &message, "p2p1", "p2p1_1"));
        assert!(!validator.validate("OFFLINE", "SLAVE", &message, "p2p2", "p2p1_1"));
        assert!(!validator.validate("OFFLINE", "SLAVE", &message, "p2p1", "p2p1_2"));
    }

    #[test]
    fn test_message_display() {
        assert_eq!(offline_to_slave().to_string(), "p2p1/p2p1_1: OFFLINE -> SLAVE");
    }

    #[test]
    fn test_logging_helpers_do_not_panic_without_subscriber() {
        let validator = TransitionValidator::new(tracing::info_span!("transition"));
        validator.log_started(&offline_to_slave());
        validator.log_completed(&offline_to_slave());
    }
}
