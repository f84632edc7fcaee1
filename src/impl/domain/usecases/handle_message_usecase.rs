use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fractic_server_error::ServerError;
use tracing::{debug, info};

use crate::{
    data::repositories::{
        chat_repository_impl::ChatRepositoryImpl,
        extraction_repository_impl::ExtractionRepositoryImpl,
        ledger_repository_impl::LedgerRepositoryImpl,
    },
    domain::{
        logic::{
            channel_address::STATUS_BROADCAST,
            command_dispatcher::{parse_command, CommandDispatcher},
            identity_resolver::IdentityResolver,
            reconciler::Reconciler,
            utils::KeyedLocks,
        },
        repositories::{
            chat_repository::ChatRepository, extraction_repository::ExtractionRepository,
            ledger_repository::LedgerRepository,
        },
    },
    entities::{Account, ExtractionResult, InboundMessage, Resolution},
    presentation::reply_fmt::ReplyFormatter,
};

#[async_trait]
pub trait HandleMessageUsecase: Send + Sync {
    /// Runs one inbound message to completion, including the reply.
    async fn handle(&self, message: InboundMessage) -> Result<(), ServerError>;
}

pub(crate) struct HandleMessageUsecaseImpl<
    L = LedgerRepositoryImpl,     // Default.
    C = ChatRepositoryImpl,       // Default.
    X = ExtractionRepositoryImpl, // Default.
> where
    L: LedgerRepository,
    C: ChatRepository,
    X: ExtractionRepository,
{
    ledger_repository: Arc<L>,
    chat_repository: Arc<C>,
    extraction_repository: X,
    formatter: Arc<ReplyFormatter>,
    address_locks: KeyedLocks,
}

impl<L, C, X> HandleMessageUsecaseImpl<L, C, X>
where
    L: LedgerRepository,
    C: ChatRepository,
    X: ExtractionRepository,
{
    pub(crate) fn new(
        ledger_repository: Arc<L>,
        chat_repository: Arc<C>,
        extraction_repository: X,
        formatter: Arc<ReplyFormatter>,
    ) -> Self {
        Self {
            ledger_repository,
            chat_repository,
            extraction_repository,
            formatter,
            address_locks: KeyedLocks::new(),
        }
    }

    async fn reply(&self, message: &InboundMessage, text: String) -> Result<(), ServerError> {
        self.chat_repository.send_text(&message.address, &text).await
    }

    async fn handle_resolved(
        &self,
        message: &InboundMessage,
        account: Account,
    ) -> Result<(), ServerError> {
        if let Some(command) = parse_command(&message.body) {
            debug!(account_id = %account.id, ?command, "dispatching command");
            let reply = CommandDispatcher::new(self.ledger_repository.as_ref(), &self.formatter)
                .dispatch(&account, command)
                .await;
            return self.reply(message, reply).await;
        }

        let reference_date = Utc::now().date_naive();
        let intents = match self
            .extraction_repository
            .extract(&message.body, reference_date)
            .await
        {
            ExtractionResult::Intents(intents) => intents,
            ExtractionResult::RateLimited => {
                return self.reply(message, self.formatter.rate_limited()).await
            }
            ExtractionResult::ParseFailed => {
                return self.reply(message, self.formatter.not_understood()).await
            }
        };
        debug!(account_id = %account.id, intents = intents.len(), "intents extracted");

        let outcomes = Reconciler::new(self.ledger_repository.as_ref(), &account, &message.address)
            .reconcile(intents)
            .await;
        self.reply(message, self.formatter.summary(&outcomes)).await
    }
}

#[async_trait]
impl<L, C, X> HandleMessageUsecase for HandleMessageUsecaseImpl<L, C, X>
where
    L: LedgerRepository,
    C: ChatRepository,
    X: ExtractionRepository,
{
    async fn handle(&self, message: InboundMessage) -> Result<(), ServerError> {
        if message.is_group || message.is_status || message.address == STATUS_BROADCAST {
            return Ok(());
        }
        if message.body.trim().is_empty() {
            debug!(address = %message.address, "ignoring message without text");
            return Ok(());
        }

        let resolution = IdentityResolver::new(
            self.ledger_repository.as_ref(),
            self.chat_repository.as_ref(),
            &self.address_locks,
        )
        .resolve(&message)
        .await?;

        match resolution {
            Resolution::ResolvedByAddress(account) => self.handle_resolved(&message, account).await,
            Resolution::ResolvedByAutoLink(account) => {
                info!(account_id = %account.id, address = %message.address, "channel address linked");
                self.reply(&message, self.formatter.link_confirmation(&account))
                    .await
            }
            Resolution::Unresolvable => {
                self.reply(&message, self.formatter.onboarding_prompt())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use iso_currency::Currency;

    use super::*;
    use crate::{
        entities::{EntryKind, EntryPatch, IntentAction, TransactionIntent},
        test_support::{
            account, dec, inbound, FakeChatRepository, FakeExtractionRepository,
            FakeLedgerRepository,
        },
    };

    const ANA_ADDRESS: &str = "5579999887766@c.us";

    type Usecase =
        HandleMessageUsecaseImpl<FakeLedgerRepository, FakeChatRepository, FakeExtractionRepository>;

    fn usecase(extraction: ExtractionResult) -> Usecase {
        let ledger = FakeLedgerRepository::with_accounts(vec![
            account(1, "Ana", "79999887766", Some(ANA_ADDRESS)),
            account(2, "Bruno", "11987654321", None),
        ]);
        HandleMessageUsecaseImpl::new(
            Arc::new(ledger),
            Arc::new(FakeChatRepository::new()),
            FakeExtractionRepository::returning(extraction),
            Arc::new(ReplyFormatter::new(Currency::BRL)),
        )
    }

    fn lunch() -> TransactionIntent {
        TransactionIntent {
            action: IntentAction::Create,
            target_id: None,
            search_amount: None,
            patch: EntryPatch {
                kind: Some(EntryKind::Expense),
                amount: Some(dec("25.5")),
                description: Some("lunch".into()),
                category: Some("food".into()),
                date: None,
            },
        }
    }

    #[tokio::test]
    async fn test_group_and_status_messages_are_dropped() {
        let usecase = usecase(ExtractionResult::Intents(vec![lunch()]));
        let mut group = inbound(ANA_ADDRESS, "spent 10");
        group.is_group = true;
        let mut status = inbound(ANA_ADDRESS, "spent 10");
        status.is_status = true;

        usecase.handle(group).await.unwrap();
        usecase.handle(status).await.unwrap();
        usecase
            .handle(inbound(STATUS_BROADCAST, "spent 10"))
            .await
            .unwrap();

        assert!(usecase.chat_repository.sent().is_empty());
        assert_eq!(usecase.extraction_repository.calls(), 0);
    }

    #[tokio::test]
    async fn test_bound_sender_gets_summary() {
        let usecase = usecase(ExtractionResult::Intents(vec![lunch()]));

        usecase
            .handle(inbound(ANA_ADDRESS, "spent 25.50 on lunch"))
            .await
            .unwrap();

        let entries = usecase.ledger_repository.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "Food");
        assert_eq!(entries[0].date, Utc::now().date_naive());
        let sent = usecase.chat_repository.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ANA_ADDRESS);
        assert!(sent[0].1.starts_with("✅ *Saved! (#1)*"));
    }

    #[tokio::test]
    async fn test_auto_link_ends_turn_without_extraction() {
        let usecase = usecase(ExtractionResult::Intents(vec![lunch()]));

        usecase
            .handle(inbound("5511987654321@c.us", "spent 25.50 on lunch"))
            .await
            .unwrap();

        assert_eq!(
            usecase.ledger_repository.account(2).channel_address.as_deref(),
            Some("5511987654321@c.us")
        );
        assert_eq!(usecase.extraction_repository.calls(), 0);
        assert!(usecase.ledger_repository.entries().is_empty());
        assert!(usecase.chat_repository.sent()[0].1.starts_with("🔗 Linked!"));
    }

    #[tokio::test]
    async fn test_unknown_sender_gets_onboarding_prompt() {
        let usecase = usecase(ExtractionResult::Intents(vec![lunch()]));

        usecase
            .handle(inbound("5521900000000@c.us", "hello"))
            .await
            .unwrap();

        let formatter = ReplyFormatter::new(Currency::BRL);
        assert_eq!(
            usecase.chat_repository.sent(),
            vec![(
                "5521900000000@c.us".to_string(),
                formatter.onboarding_prompt()
            )]
        );
        assert_eq!(usecase.ledger_repository.write_count(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failures_reply_without_writes() {
        for (result, expected) in [
            (ExtractionResult::RateLimited, "⏳"),
            (ExtractionResult::ParseFailed, "🤔 I didn't understand."),
            (ExtractionResult::Intents(vec![]), "🤔 I couldn't find"),
        ] {
            let usecase = usecase(result);
            usecase.handle(inbound(ANA_ADDRESS, "blah")).await.unwrap();

            assert!(usecase.chat_repository.sent()[0].1.starts_with(expected));
            assert_eq!(usecase.ledger_repository.write_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_command_bypasses_extraction() {
        let usecase = usecase(ExtractionResult::Intents(vec![lunch()]));

        usecase
            .handle(inbound(ANA_ADDRESS, "!nome Ana Maria"))
            .await
            .unwrap();

        assert_eq!(usecase.extraction_repository.calls(), 0);
        assert_eq!(usecase.ledger_repository.account(1).name, "Ana Maria");
        assert_eq!(
            usecase.chat_repository.sent()[0].1,
            "✅ Name changed to: *Ana Maria*"
        );
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let usecase = usecase(ExtractionResult::Intents(vec![lunch()]));
        usecase.chat_repository.fail_sends();

        let result = usecase.handle(inbound(ANA_ADDRESS, "spent 25.50")).await;

        assert!(result.is_err());
        // The entry is committed even if the confirmation could not be sent.
        assert_eq!(usecase.ledger_repository.entries().len(), 1);
    }
}
