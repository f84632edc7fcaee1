use std::sync::Arc;

use fractic_server_error::ServerError;
use tokio::{
    net::TcpListener,
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};

use crate::{
    config::BotConfig,
    data::{
        datasources::{
            gemini_datasource::GeminiDatasourceImpl, postgres_datasource::PostgresDatasourceImpl,
            wppconnect_datasource::WppConnectDatasourceImpl,
        },
        repositories::{
            chat_repository_impl::ChatRepositoryImpl,
            extraction_repository_impl::ExtractionRepositoryImpl,
            ledger_repository_impl::LedgerRepositoryImpl,
        },
    },
    domain::{
        logic::auth_relay::AuthRelay,
        usecases::handle_message_usecase::{HandleMessageUsecase, HandleMessageUsecaseImpl},
    },
    entities::InboundMessage,
    errors::{HttpBindFailed, HttpServeFailed},
    presentation::{reply_fmt::ReplyFormatter, webhook_server::webhook_router},
};

/// The assembled service: webhook server, message workers and auth relay.
pub struct LedgerBot {
    config: BotConfig,
}

impl LedgerBot {
    pub fn new(config: BotConfig) -> Self {
        Self { config }
    }

    /// Connects every adapter and serves until Ctrl-C. Fails only on startup
    /// errors (store connection, HTTP bind) or if the server dies.
    pub async fn run(self) -> Result<(), ServerError> {
        let config = self.config;

        let store = PostgresDatasourceImpl::connect(&config.database_url, config.database_pool_size)
            .await?;
        let ledger = Arc::new(LedgerRepositoryImpl::new(store));
        let chat = Arc::new(ChatRepositoryImpl::new(WppConnectDatasourceImpl::new(
            config.wppconnect_url.clone(),
            config.wppconnect_session.clone(),
            config.wppconnect_token.clone(),
        )?));
        let extraction = ExtractionRepositoryImpl::new(GeminiDatasourceImpl::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.oracle_timeout,
        )?);
        let formatter = Arc::new(ReplyFormatter::new(config.currency));

        let relay = AuthRelay::new(ledger.clone(), chat.clone(), formatter.clone());
        let relay_task = tokio::spawn(async move { relay.run().await });

        let usecase = Arc::new(HandleMessageUsecaseImpl::new(
            ledger, chat, extraction, formatter,
        ));
        let (queue, receiver) = mpsc::channel(config.message_queue_capacity);
        let workers = spawn_workers(usecase, receiver, config.message_workers);

        let listener = TcpListener::bind(&config.http_bind)
            .await
            .map_err(|e| HttpBindFailed::with_debug(&config.http_bind, &e))?;
        info!(
            addr = %config.http_bind,
            workers = config.message_workers,
            queue_capacity = config.message_queue_capacity,
            "webhook server listening"
        );
        let served = axum::serve(listener, webhook_router(queue))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| HttpServeFailed::with_debug(&e));

        // The router owned the only sender, so workers drain the queue and exit.
        relay_task.abort();
        for worker in workers {
            let _ = worker.await;
        }
        info!("shut down");
        served
    }
}

/// Workers share one receiver; each message is handled by exactly one worker,
/// and messages of one worker are handled one at a time.
fn spawn_workers<U>(
    usecase: Arc<U>,
    receiver: mpsc::Receiver<InboundMessage>,
    count: usize,
) -> Vec<JoinHandle<()>>
where
    U: HandleMessageUsecase + 'static,
{
    let receiver = Arc::new(Mutex::new(receiver));
    (0..count)
        .map(|worker| {
            let usecase = usecase.clone();
            let receiver = receiver.clone();
            tokio::spawn(async move {
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(message) = next else {
                        break;
                    };
                    let address = message.address.clone();
                    if let Err(e) = usecase.handle(message).await {
                        warn!(worker, %address, error = ?e, "message dropped");
                    }
                }
            })
        })
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
