//! Server state and configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::export::{CanvasRasterizer, CardExporter, FontCache};
use crate::generation::GenerationService;
use crate::orchestrator::GenerationOrchestrator;
use crate::share::ShareDispatcher;

/// Idle time after which a browser session is dropped.
pub const SESSION_EXPIRATION_SECS: u64 = 30 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Where exports fetch the card fonts from. `None` keeps exports offline
    /// with the bitmap face.
    pub font_base_url: Option<String>,
}

/// What the on-screen card is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub flipped: bool,
}

/// One browser tab: its postcard, its exporter (and font cache), its share
/// dispatcher and its preview state.
pub struct Session {
    pub orchestrator: GenerationOrchestrator,
    pub exporter: CardExporter,
    pub dispatcher: ShareDispatcher,
    pub preview: RwLock<PreviewState>,
}

impl Session {
    pub fn new(service: Arc<dyn GenerationService>, exporter: CardExporter) -> Self {
        Self {
            orchestrator: GenerationOrchestrator::new(service),
            exporter,
            dispatcher: ShareDispatcher::new(),
            preview: RwLock::new(PreviewState::default()),
        }
    }

    /// "Start Over": drop the card and end the preview session.
    pub async fn reset(&self) {
        self.orchestrator.reset().await;
        *self.preview.write().await = PreviewState::default();
        self.exporter.fonts().clear().await;
        self.exporter.images().clear().await;
    }
}

/// A session with its idle timer.
pub struct SessionEntry {
    pub session: Arc<Session>,
    pub last_accessed: Instant,
}

impl SessionEntry {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            last_accessed: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: u64,
    pub http_client: reqwest::Client,
    pub service: Arc<dyn GenerationService>,
    pub sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        service: Arc<dyn GenerationService>,
        http_client: reqwest::Client,
    ) -> Self {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            config,
            boot_time,
            http_client,
            service,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn new_exporter(&self) -> CardExporter {
        let fonts = match &self.config.font_base_url {
            Some(base_url) => FontCache::new(self.http_client.clone(), base_url.clone()),
            None => FontCache::offline(),
        };
        CardExporter::new(
            Arc::new(CanvasRasterizer),
            Arc::new(fonts),
            self.http_client.clone(),
        )
    }

    pub async fn create_session(&self) -> (Uuid, Arc<Session>) {
        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(self.service.clone(), self.new_exporter()));
        self.sessions
            .write()
            .await
            .insert(id, SessionEntry::new(session.clone()));
        (id, session)
    }

    /// Look up a session and refresh its idle timer.
    pub async fn session(&self, id: Uuid) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.touch();
        Some(entry.session.clone())
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub async fn expire_sessions(&self, now: Instant, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_accessed) < max_idle);
        before - sessions.len()
    }
}
