//! Application wiring.
//!
//! Builds every collaborator from [`AppConfig`], starts the background consumers and hands
//! back a [`Server`] ready to run.

use std::sync::Arc;

use pixelwar_shared::time::Clock;
use thiserror::Error;

use crate::{
    config::AppConfig,
    domain::{SessionStatus, TransportError, ValueObjectError},
    infrastructure::{
        identity::{InMemorySessionDirectory, StaticAdminDirectory},
        message_pusher::WebSocketMessagePusher,
        notifier::HttpCallbackNotifier,
        object_store::FileSystemObjectStore,
        queue::{InMemoryQueue, QueueReceiver},
        repository::{
            InMemoryConnectionRepository, InMemoryGameSessionRepository, InMemoryPixelRepository,
            InMemoryRateLimitRepository, InMemorySnapshotRepository,
        },
        topic::BroadcastTopic,
    },
    ui::{
        AppState, Server,
        consumer::{DrawQueueHandler, SnapshotQueueHandler, run_fanout_subscriber},
    },
    usecase::{
        AuthorizeUseCase, BroadcastFanout, ConnectionRegistry, GetCanvasUseCase,
        GetGameStateUseCase, ListSnapshotsUseCase, ProcessDrawUseCase, RateLimiter,
        RenderSnapshotUseCase, RequestSnapshotUseCase, SessionGateError, SessionGateUseCase,
        SubmitPixelUseCase,
    },
};

/// Name of the principal recorded when the server opens the canvas on startup
pub const STARTUP_PRINCIPAL: &str = "system";

/// Startup errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValueObjectError),
    #[error("failed to create callback notifier: {0}")]
    Notifier(TransportError),
    #[error("failed to open the canvas: {0}")]
    Session(#[from] SessionGateError),
    #[error("failed to prepare snapshot directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Fully wired application whose background consumers have not started yet
pub struct Application {
    config: AppConfig,
    state: Arc<AppState>,
    session_directory: Arc<InMemorySessionDirectory>,
    session_gate: Arc<SessionGateUseCase>,
    topic: BroadcastTopic,
    fanout: Arc<BroadcastFanout>,
    draw_receiver: QueueReceiver,
    draw_handler: Arc<DrawQueueHandler>,
    snapshot_receiver: QueueReceiver,
    snapshot_handler: Arc<SnapshotQueueHandler>,
}

impl Application {
    /// Wire every layer from the configuration
    pub fn build(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let canvas_id = config.board.canvas_id()?;
        let bounds = config.board.bounds();

        // 1. Repository (in-memory store)
        let pixel_repository = Arc::new(InMemoryPixelRepository::new());
        let rate_limit_repository = Arc::new(InMemoryRateLimitRepository::new(clock.clone()));
        let session_repository = Arc::new(InMemoryGameSessionRepository::new());
        let connection_repository = Arc::new(InMemoryConnectionRepository::new());
        let snapshot_repository = Arc::new(InMemorySnapshotRepository::new());

        // 2. Queue / Topic / ObjectStore / MessagePusher / Notifier
        let (draw_queue, draw_receiver) =
            InMemoryQueue::channel("draw", config.queue_max_receive_count);
        let (snapshot_queue, snapshot_receiver) =
            InMemoryQueue::channel("snapshot", config.queue_max_receive_count);
        let topic = BroadcastTopic::default();
        let publisher = Arc::new(topic.clone());
        let object_store = Arc::new(FileSystemObjectStore::new(
            config.snapshot_dir.clone(),
            config.public_base_url.clone(),
        ));
        let message_pusher = Arc::new(WebSocketMessagePusher::new());
        let notifier = Arc::new(HttpCallbackNotifier::new().map_err(AppError::Notifier)?);

        // 3. Identity
        let session_directory = Arc::new(InMemorySessionDirectory::new(clock.clone()));
        let admin_directory = Arc::new(StaticAdminDirectory::new(config.admins.clone()));

        // 4. UseCases
        let rate_limiter = Arc::new(RateLimiter::new(
            rate_limit_repository,
            config.board.max_pixels_per_window,
            config.board.window_seconds,
        ));
        let connection_registry = Arc::new(ConnectionRegistry::new(
            connection_repository,
            clock.clone(),
        ));
        let session_gate = Arc::new(SessionGateUseCase::new(
            session_repository.clone(),
            publisher.clone(),
            clock.clone(),
            canvas_id.clone(),
        ));
        let submit_pixel = Arc::new(SubmitPixelUseCase::new(
            session_repository.clone(),
            rate_limiter.clone(),
            Arc::new(draw_queue),
            clock.clone(),
            canvas_id.clone(),
            bounds,
        ));
        let process_draw = Arc::new(ProcessDrawUseCase::new(
            pixel_repository.clone(),
            session_repository.clone(),
            publisher.clone(),
            rate_limiter,
            clock.clone(),
        ));
        let render_snapshot = Arc::new(RenderSnapshotUseCase::new(
            pixel_repository.clone(),
            snapshot_repository.clone(),
            object_store,
            notifier,
            publisher,
            clock.clone(),
            canvas_id.clone(),
            bounds,
            config.board.background.clone(),
        ));
        let fanout = Arc::new(BroadcastFanout::new(
            connection_registry.clone(),
            message_pusher.clone(),
        ));

        // 5. AppState
        let state = Arc::new(AppState {
            board: bounds,
            submit_pixel_usecase: submit_pixel,
            session_gate_usecase: session_gate.clone(),
            authorize_usecase: Arc::new(AuthorizeUseCase::new(
                session_directory.clone(),
                admin_directory,
                config.internal_secret.clone(),
            )),
            request_snapshot_usecase: Arc::new(RequestSnapshotUseCase::new(
                Arc::new(snapshot_queue),
                clock,
            )),
            list_snapshots_usecase: Arc::new(ListSnapshotsUseCase::new(
                snapshot_repository.clone(),
                canvas_id.clone(),
            )),
            get_canvas_usecase: Arc::new(GetCanvasUseCase::new(
                pixel_repository,
                canvas_id.clone(),
            )),
            get_game_state_usecase: Arc::new(GetGameStateUseCase::new(
                session_repository,
                snapshot_repository,
                connection_registry.clone(),
                canvas_id,
            )),
            connection_registry,
            message_pusher,
        });

        Ok(Self {
            config,
            state,
            session_directory,
            session_gate,
            topic,
            fanout,
            draw_receiver,
            draw_handler: Arc::new(DrawQueueHandler::new(process_draw)),
            snapshot_receiver,
            snapshot_handler: Arc::new(SnapshotQueueHandler::new(render_snapshot)),
        })
    }

    /// Session table used to resolve `Authorization: Bearer <sessionId>`
    pub fn session_directory(&self) -> Arc<InMemorySessionDirectory> {
        self.session_directory.clone()
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Start the queue workers and the fan-out subscriber, then return the server
    ///
    /// Opens the canvas first when `start_running` is configured.
    pub async fn start(self) -> Result<Server, AppError> {
        tokio::fs::create_dir_all(&self.config.snapshot_dir).await?;

        let subscription = self.topic.subscribe();
        tokio::spawn(run_fanout_subscriber(subscription, self.fanout));
        tokio::spawn(self.draw_receiver.run(self.draw_handler));
        tokio::spawn(self.snapshot_receiver.run(self.snapshot_handler));

        if self.config.start_running {
            let session = self.session_gate.current_session().await?;
            if session.status != SessionStatus::Running {
                self.session_gate.resume(STARTUP_PRINCIPAL).await?;
            }
        }

        Ok(Server::new(self.state, self.config.snapshot_dir))
    }
}
