use tracing::debug;

use crate::domain::{Message, Role};

/// Converts `(actor, text)` pairs into typed messages.
///
/// Actor labels are matched case-insensitively against `human`, `ai` and
/// `system`. Turns with any other label are dropped without error, and the
/// remaining messages keep their original relative order.
///
/// ```
/// use chatchain::{normalize, Message};
///
/// let history = normalize([
///     ("human", "What did I do on my birthday?"),
///     ("narrator", "ignored"),
///     ("AI", "You stayed home."),
/// ]);
/// assert_eq!(
///     history,
///     vec![Message::human("What did I do on my birthday?"), Message::ai("You stayed home.")]
/// );
/// ```
pub fn normalize<I, L, T>(turns: I) -> Vec<Message>
where
    I: IntoIterator<Item = (L, T)>,
    L: AsRef<str>,
    T: Into<String>,
{
    turns
        .into_iter()
        .filter_map(|(label, text)| match Role::from_label(label.as_ref()) {
            Some(role) => Some(Message::new(role, text)),
            None => {
                debug!("Dropping chat turn with unrecognized actor '{}'", label.as_ref());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let turns: Vec<(&str, &str)> = vec![];
        assert!(normalize(turns).is_empty());
    }

    #[test]
    fn test_single_message() {
        let history = normalize([("human", "Hello, how are you?")]);

        assert_eq!(history.len(), 1);
        assert!(history[0].is_human());
        assert_eq!(history[0].content(), "Hello, how are you?");
    }

    #[test]
    fn test_mixed_roles_keep_order() {
        let history = normalize([
            ("human", "What did I do on my birthday?"),
            ("system", "The user stayed at home all day and watched TV."),
            ("ai", "Sounds like you had a great time on your birthday!"),
        ]);

        assert_eq!(
            history,
            vec![
                Message::human("What did I do on my birthday?"),
                Message::system("The user stayed at home all day and watched TV."),
                Message::ai("Sounds like you had a great time on your birthday!"),
            ]
        );
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let lower = normalize([("human", "x")]);
        assert_eq!(normalize([("Human", "x")]), lower);
        assert_eq!(normalize([("HUMAN", "x")]), lower);

        let history = normalize([("HUMAN", "Hello"), ("AI", "Hi there"), ("System", "note")]);
        assert!(history[0].is_human());
        assert!(history[1].is_ai());
        assert!(history[2].is_system());
    }

    #[test]
    fn test_unknown_labels_are_dropped() {
        let history = normalize([("human", "a"), ("bogus", "b"), ("ai", "c")]);
        assert_eq!(history, vec![Message::human("a"), Message::ai("c")]);
    }

    #[test]
    fn test_padded_labels_are_dropped() {
        let history = normalize([(" human", "a"), ("ai", "b"), ("system\n", "c")]);
        assert_eq!(history, vec![Message::ai("b")]);
    }

    #[test]
    fn test_all_unknown_labels() {
        let history = normalize([("user", "a"), ("assistant", "b")]);
        assert!(history.is_empty());
    }

    #[test]
    fn test_owned_pairs() {
        let turns = vec![("ai".to_string(), "owned".to_string())];
        assert_eq!(normalize(turns), vec![Message::ai("owned")]);
    }
}
