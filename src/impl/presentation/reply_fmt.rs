use iso_currency::Currency;

use crate::entities::{Account, IntentAction, Outcome};

use super::utils::format_amount;

pub(crate) const HELP_TEXT: &str = "📒 Send me your expenses and income in plain words, \
for example:\n\
• _spent 25.50 on lunch, category food_\n\
• _received 1500 salary_\n\
• _the 25.50 was actually groceries_\n\
\n\
Commands:\n\
• *!name <new name>* changes your display name\n\
• *!help* shows this message";

/// Composes every outbound message text.
pub(crate) struct ReplyFormatter {
    currency: Currency,
}

impl ReplyFormatter {
    pub(crate) fn new(currency: Currency) -> Self {
        Self { currency }
    }

    pub(crate) fn onboarding_prompt(&self) -> String {
        "👋 I don't know this number yet. Sign up first, or reply with the phone \
         number you registered with to link this chat."
            .to_string()
    }

    pub(crate) fn link_confirmation(&self, account: &Account) -> String {
        format!(
            "🔗 Linked! Hi *{}*, this chat is now connected to your account. \
             Send me your expenses and income.",
            account.name
        )
    }

    pub(crate) fn not_understood(&self) -> String {
        "🤔 I didn't understand.".to_string()
    }

    pub(crate) fn nothing_understood(&self) -> String {
        "🤔 I couldn't find any expense or income in that message.".to_string()
    }

    pub(crate) fn rate_limited(&self) -> String {
        "⏳ Extraction limit reached. Please wait a minute and try again.".to_string()
    }

    pub(crate) fn name_changed(&self, name: &str) -> String {
        format!("✅ Name changed to: *{name}*")
    }

    pub(crate) fn name_usage(&self) -> String {
        "Usage: *!name <new name>*".to_string()
    }

    pub(crate) fn command_failed(&self) -> String {
        "❌ Could not apply the command. Please try again.".to_string()
    }

    pub(crate) fn help(&self) -> String {
        HELP_TEXT.to_string()
    }

    pub(crate) fn auth_code(&self, code: &str) -> String {
        format!("🔐 Code: *{code}*")
    }

    /// One message aggregating every outcome, in intent order.
    pub(crate) fn summary(&self, outcomes: &[Outcome]) -> String {
        if outcomes.is_empty() {
            return self.nothing_understood();
        }
        outcomes
            .iter()
            .map(|o| self.outcome(o))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn outcome(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Created(entry) => format!(
                "✅ *Saved! (#{})*\n🏷️ {}\n💰 {}\n📝 {}",
                entry.id,
                entry.category,
                format_amount(entry.amount, self.currency),
                entry.description,
            ),
            Outcome::Edited { id } => format!("✏️ *Updated (#{id})!*"),
            Outcome::Unchanged { id } => format!("ℹ️ Nothing to change in #{id}."),
            Outcome::TargetNotFound {
                target_id: Some(id),
                ..
            } => format!("❌ Entry #{id} not found."),
            Outcome::TargetNotFound {
                search_amount: Some(amount),
                ..
            } => format!(
                "❌ No entry of {} found.",
                format_amount(*amount, self.currency)
            ),
            Outcome::TargetNotFound { .. } => {
                "❌ Which entry should I edit? Tell me its number or amount.".to_string()
            }
            Outcome::PersistenceFailed {
                action: IntentAction::Create,
            } => "❌ Error saving.".to_string(),
            Outcome::PersistenceFailed {
                action: IntentAction::Edit,
            } => "❌ Error editing.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::{
        entities::{EntryKind, LedgerEntry, LedgerEntryId},
        test_support::{account_id, date, dec},
    };

    #[test]
    fn test_summary_aggregates_every_outcome() {
        let formatter = ReplyFormatter::new(Currency::BRL);
        let created = LedgerEntry {
            id: LedgerEntryId(7),
            account_id: account_id(1),
            kind: EntryKind::Expense,
            amount: dec("25.5"),
            description: "lunch".into(),
            category: "Food".into(),
            date: date("2024-05-01"),
            channel_phone: "a@c.us".into(),
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
        };

        let summary = formatter.summary(&[
            Outcome::Created(created),
            Outcome::Edited { id: LedgerEntryId(3) },
            Outcome::TargetNotFound {
                target_id: None,
                search_amount: Some(dec("10")),
            },
            Outcome::PersistenceFailed {
                action: IntentAction::Create,
            },
        ]);

        assert_eq!(
            summary,
            "✅ *Saved! (#7)*\n🏷️ Food\n💰 R$ 25.50\n📝 lunch\n\n\
             ✏️ *Updated (#3)!*\n\n\
             ❌ No entry of R$ 10.00 found.\n\n\
             ❌ Error saving."
        );
    }

    #[test]
    fn test_empty_summary_is_nothing_understood() {
        let formatter = ReplyFormatter::new(Currency::BRL);
        assert_eq!(formatter.summary(&[]), formatter.nothing_understood());
    }
}
