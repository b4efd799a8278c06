use std::time::{Duration, Instant};

use ra::{
    same_game_id, Command, GameSnapshot, Level, ServerEvent, SpectateResponse, StartRequest,
    UpdateEnvelope,
};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionStatus, DisconnectReason, ReconnectAction};
use crate::dispatcher::{normalize_game_id, Dispatcher};
use crate::error::DispatchError;
use crate::game_list::GameList;
use crate::intent::Intent;
use crate::interaction::{InteractionMachine, InteractionState, Selection};
use crate::notice::{Notice, Notices};
use crate::pacing::{Clock, PacingQueue};
use crate::reconciler::{Reconciled, StateReconciler};
use crate::session::{SessionRecord, SessionStore, Storage};

/// An update waiting in the pacing queue.
#[derive(Clone, Debug)]
struct Release {
    /// Session epoch at arrival. Releases from an earlier epoch are dropped.
    epoch: u64,
    /// The game this update belongs to, if known.
    game_id: Option<String>,
    envelope: UpdateEnvelope,
}

/// Keeps the local view of a game in sync with the server.
///
/// All inputs arrive through method calls: connection changes, server
/// events, user intents, and the passing of time via
/// [`SyncController::release_due`]. Outbound messages go to the channel,
/// anything for the user ends up in the notices.
pub struct SyncController<C, S, K> {
    connection: ConnectionManager<C>,
    session: SessionStore<S>,
    reconciler: StateReconciler,
    pacing: PacingQueue<Release>,
    interaction: InteractionMachine,
    games: GameList,
    notices: Notices,
    clock: K,
    game_id: Option<String>,
    player_name: Option<String>,
    /// Set once the server accepted a login.
    username: Option<String>,
    epoch: u64,
    /// Whether the next successful join should be followed by a `LOAD`.
    load_on_join: bool,
}

impl<C: Channel, S: Storage, K: Clock> SyncController<C, S, K> {
    /// Creates a controller and restores the saved session, if any. The saved
    /// game is joined and loaded once the connection is up.
    pub fn new(channel: C, storage: S, clock: K, config: &ClientConfig) -> Self {
        let session = SessionStore::new(storage);
        let restored = session.restore();
        let mut controller = Self {
            connection: ConnectionManager::new(channel, config.reconnect),
            session,
            reconciler: StateReconciler::new(),
            pacing: PacingQueue::new(config.pacing_interval()),
            interaction: InteractionMachine::new(),
            games: GameList::new(),
            notices: Notices::new(),
            clock,
            game_id: None,
            player_name: None,
            username: None,
            epoch: 0,
            load_on_join: false,
        };
        if let Some(record) = restored.filter(|record| !record.game_id.is_empty()) {
            info!(game_id = %record.game_id, player_name = %record.player_name, "Restored session");
            controller.game_id = Some(record.game_id);
            controller.player_name = Some(record.player_name).filter(|name| !name.is_empty());
            controller.load_on_join = true;
        }
        controller
    }

    /// To be called whenever the channel is (re)connected.
    pub fn on_connect(&mut self) {
        if let Some(token) = self.session.restore_token() {
            let result = Dispatcher::new(self.connection.channel_mut(), None).login_with_token(&token);
            self.report(result);
        }
        let record = self.game_id.as_ref().map(|game_id| SessionRecord {
            game_id: game_id.clone(),
            player_name: self.player_name.clone().unwrap_or_default(),
        });
        self.connection.on_connect(record.as_ref(), &mut self.notices);
    }

    pub fn on_disconnect(&mut self, reason: &DisconnectReason) -> ReconnectAction {
        self.connection.on_disconnect(reason, &mut self.notices)
    }

    /// The delay before the next reconnection attempt. Once the attempts are
    /// used up the connection is declared lost, the session is dropped and
    /// `None` is returned.
    pub fn next_retry<R: Rng>(&mut self, rng: &mut R) -> Option<Duration> {
        let delay = self.connection.next_retry(rng);
        if delay.is_none() && self.connection.status() != ConnectionStatus::Lost {
            self.connection.give_up(&mut self.notices);
            self.reset_session();
        }
        delay
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Update(payload) => self.enqueue_updates(payload.into_envelopes()),
            ServerEvent::Logout(response) => {
                self.notices.push(response.level, response.message);
                self.logged_out();
            }
            ServerEvent::Spectate(SpectateResponse::Joined(joined)) => {
                info!(game_id = %joined.game_id, player_name = %joined.player_name, "Joined game");
                let load = std::mem::take(&mut self.load_on_join);
                if self.is_other_game(&joined.game_id) {
                    self.switch_game();
                }
                self.game_id = Some(joined.game_id);
                if !joined.player_name.is_empty() {
                    self.player_name = Some(joined.player_name);
                }
                self.persist_session();
                if load {
                    let result =
                        Dispatcher::new(self.connection.channel_mut(), self.game_id.as_deref())
                            .act(Command::Load);
                    self.report(result);
                }
            }
            ServerEvent::Spectate(SpectateResponse::Rejected(response)) => {
                self.notices.push(response.level, response.message);
                if self.load_on_join && self.reconciler.current().is_none() {
                    // The saved game is gone.
                    self.reset_session();
                }
                self.load_on_join = false;
            }
            ServerEvent::ListGames(list) => self.games.apply(list),
            ServerEvent::Delete(response) => {
                let deleted = response.level == Level::Success;
                self.notices.push(response.level, response.message);
                if deleted {
                    self.list_games();
                }
            }
            ServerEvent::Login(response) => {
                let message = if response.message.is_empty() {
                    String::from("Unknown")
                } else {
                    response.message
                };
                self.notices.push(response.level, message);
                if let (Some(token), Some(username)) = (response.token, response.username) {
                    info!(%username, "Logged in");
                    self.session.save_token(&token);
                    self.username = Some(username);
                    self.persist_session();
                }
            }
            ServerEvent::StartGame(response) => {
                self.notices.push(response.level, response.message);
            }
            ServerEvent::Disconnect { reason } => {
                // The transport reports the disconnect itself.
                debug!(%reason, "Server announced disconnect");
            }
        }
    }

    fn enqueue_updates(&mut self, envelopes: Vec<UpdateEnvelope>) {
        // Messages without a snapshot never touch the state, so they are not
        // held back behind paced updates.
        let (envelopes, messages): (Vec<_>, Vec<_>) = envelopes
            .into_iter()
            .partition(|envelope| envelope.game_state.is_some());
        for envelope in messages {
            self.apply_envelope(envelope, None);
        }
        if envelopes.is_empty() {
            return;
        }
        let batch_game_id = envelopes.iter().find_map(|envelope| envelope.game_id.clone());
        if let Some(new_id) = &batch_game_id {
            let cancelled = self.pacing.cancel_where(|release| {
                release.game_id.as_ref().is_some_and(|id| id != new_id)
            });
            if cancelled > 0 {
                debug!(cancelled, game_id = %new_id, "Cancelled updates of another game");
            }
        }
        let fallback_id = batch_game_id.or_else(|| self.game_id.clone());
        let epoch = self.epoch;
        let releases = envelopes.into_iter().map(|envelope| Release {
            epoch,
            game_id: envelope.game_id.clone().or_else(|| fallback_id.clone()),
            envelope,
        });
        self.pacing.enqueue(self.clock.now(), releases);
        self.release_due();
    }

    /// Applies every update whose time has come. Returns how many were
    /// applied.
    pub fn release_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut applied = 0;
        while let Some(release) = self.pacing.pop_due(now) {
            if release.epoch != self.epoch {
                debug!(
                    epoch = release.epoch,
                    current_epoch = self.epoch,
                    "Dropping stale update"
                );
                continue;
            }
            if self.apply_envelope(release.envelope, release.game_id) {
                applied += 1;
            }
        }
        applied
    }

    fn apply_envelope(&mut self, envelope: UpdateEnvelope, game_id: Option<String>) -> bool {
        match self.reconciler.apply_envelope(envelope) {
            Reconciled::Applied { action, actor } => {
                self.interaction.reset();
                if let Some(game_id) = game_id {
                    self.game_id = Some(game_id);
                }
                match (actor, action) {
                    (_, Some(action)) if action.eq_ignore_ascii_case("LOAD") => {}
                    (Some(actor), Some(action)) => {
                        self.notices.push(Level::Info, format!("{}: {}", actor, action));
                    }
                    (None, Some(action)) => {
                        self.notices.push(Level::Info, action);
                    }
                    _ => {}
                }
                self.persist_session();
                true
            }
            Reconciled::Rejected { level, message } => {
                self.notices.push(level, message);
                false
            }
            Reconciled::Empty => {
                warn!("Ignoring empty update");
                false
            }
        }
    }

    /// When the next paced update is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pacing.next_deadline()
    }

    pub fn perform(&mut self, intent: Intent) {
        debug!(?intent, "Performing intent");
        match intent {
            Intent::Draw => self.draw(),
            Intent::Auction => self.auction(),
            Intent::Bid(sun_idx) => self.bid(sun_idx),
            Intent::SelectGridTile(idx) => self.select_grid_tile(idx),
            Intent::SelectOwnTile(idx) => self.select_own_tile(idx),
            Intent::Discard(name) => self.discard(&name),
            Intent::Load(game_id) => self.load(&game_id),
            Intent::Join(game_id) => self.join(&game_id),
            Intent::Leave => self.leave(),
            Intent::Start(request) => self.start(request),
            Intent::Delete(game_id) => self.delete(&game_id),
            Intent::AddPlayer(game_id) => self.add_player(&game_id),
            Intent::ListGames => self.list_games(),
            Intent::Login { username, password } => self.login(&username, &password),
            Intent::Register { username, password } => self.register(&username, &password),
            Intent::Logout => self.logout(),
        }
    }

    pub fn draw(&mut self) {
        let result = self.dispatcher().draw();
        self.report(result);
    }

    pub fn auction(&mut self) {
        let result = self.dispatcher().auction();
        self.report(result);
    }

    pub fn bid(&mut self, sun_idx: Option<usize>) {
        let result = self.dispatcher().bid(sun_idx);
        self.report(result);
    }

    pub fn discard(&mut self, name: &str) {
        let result = self.dispatcher().discard(name);
        self.report(result);
    }

    pub fn select_grid_tile(&mut self, idx: usize) {
        match self.interaction.select_grid_tile(idx) {
            Selection::SourcePicked { .. } => {
                self.notices.push(
                    Level::Info,
                    "Select your golden god, or the same tile again to cancel.",
                );
            }
            Selection::Swap { source } => self.swap(source),
            Selection::Cancelled => debug!("Swap cancelled"),
            other => debug!(?other, "Unexpected grid selection"),
        }
    }

    /// Selects the tile with the given index in this player's collection.
    pub fn select_own_tile(&mut self, idx: usize) {
        let tile = self
            .own_collection()
            .and_then(|collection| collection.get(idx))
            .cloned();
        let Some(tile) = tile else {
            self.notices
                .push(Level::Warning, format!("You have no tile number {}.", idx + 1));
            return;
        };
        match self.interaction.select_own_tile(&tile) {
            Selection::Swap { source } => self.swap(source),
            Selection::Discard(name) => {
                let result = self.dispatcher().discard(&name);
                self.report(result);
            }
            Selection::NeedsSource { armed: true } => {
                self.notices.push(
                    Level::Info,
                    "Select a tile from the auction grid to take with your golden god.",
                );
            }
            other => debug!(?other, tile = %tile.name, "Nothing to do"),
        }
    }

    fn swap(&mut self, source: usize) {
        let num_tiles = self
            .reconciler
            .current()
            .map(|snapshot| snapshot.game_state.auction_tiles.len());
        let mut dispatcher = self.dispatcher();
        if let Some(num_tiles) = num_tiles {
            dispatcher = dispatcher.with_auction_tiles(num_tiles);
        }
        let result = dispatcher.swap(source);
        self.report(result);
    }

    /// Opens the game with the given id and asks for its state.
    pub fn load(&mut self, game_id: &str) {
        let game_id = match normalize_game_id(game_id) {
            Ok(game_id) => game_id,
            Err(err) => return self.report(Err(err.into())),
        };
        if !self.holds_game(&game_id) {
            self.switch_game();
        }
        self.load_on_join = false;
        let mut dispatcher = Dispatcher::new(self.connection.channel_mut(), None);
        let result = dispatcher.join(&game_id).and_then(|()| dispatcher.load(&game_id));
        if result.is_ok() {
            self.game_id = Some(game_id);
        }
        self.report(result);
    }

    /// Joins the game with the given id. Its state is loaded once the server
    /// confirms.
    pub fn join(&mut self, game_id: &str) {
        let game_id = match normalize_game_id(game_id) {
            Ok(game_id) => game_id,
            Err(err) => return self.report(Err(err.into())),
        };
        if self.is_other_game(&game_id) {
            self.switch_game();
        }
        let result = Dispatcher::new(self.connection.channel_mut(), None).join(&game_id);
        if result.is_ok() {
            self.game_id = Some(game_id);
            self.load_on_join = true;
        }
        self.report(result);
    }

    pub fn leave(&mut self) {
        let result = self.dispatcher().leave();
        let left = result.is_ok();
        self.report(result);
        if left {
            self.reset_session();
        }
    }

    pub fn start(&mut self, request: StartRequest) {
        let result = self.dispatcher().start(request);
        self.report(result);
    }

    pub fn delete(&mut self, game_id: &str) {
        let result = self.dispatcher().delete(game_id);
        self.report(result);
    }

    pub fn add_player(&mut self, game_id: &str) {
        let result = self.dispatcher().add_player(game_id);
        self.report(result);
    }

    pub fn list_games(&mut self) {
        let result = self.dispatcher().list_games();
        self.report(result);
    }

    pub fn login(&mut self, username: &str, password: &str) {
        let result = self.dispatcher().login(username, password);
        self.report(result);
    }

    pub fn register(&mut self, username: &str, password: &str) {
        let result = self.dispatcher().register(username, password);
        self.report(result);
    }

    pub fn logout(&mut self) {
        let result = self.dispatcher().logout();
        self.report(result);
        self.logged_out();
    }

    fn dispatcher(&mut self) -> Dispatcher<'_, C> {
        Dispatcher::new(self.connection.channel_mut(), self.game_id.as_deref())
    }

    fn report(&mut self, result: Result<(), DispatchError>) {
        match result {
            Ok(()) => {}
            Err(DispatchError::Invalid(err)) => {
                self.notices.push(Level::Warning, err.to_string());
            }
            Err(err @ DispatchError::Channel(_)) => {
                self.notices.push(Level::Error, err.to_string());
            }
        }
    }

    fn persist_session(&mut self) {
        let player_name = self.player_name.as_deref().or(self.username.as_deref());
        match (self.game_id.as_deref(), player_name) {
            (Some(game_id), Some(player_name)) if !game_id.is_empty() && !player_name.is_empty() => {
                self.session.save(game_id, player_name)
            }
            _ => {}
        }
    }

    fn holds_game(&self, game_id: &str) -> bool {
        self.game_id
            .as_deref()
            .is_some_and(|held| same_game_id(held, game_id))
    }

    /// Whether a game is held and it is not `game_id`.
    fn is_other_game(&self, game_id: &str) -> bool {
        self.game_id.is_some() && !self.holds_game(game_id)
    }

    /// Drops everything that belongs to the current game. Updates that are
    /// still queued are dropped when they come due.
    fn switch_game(&mut self) {
        self.epoch += 1;
        self.interaction.reset();
        self.reconciler.reset();
        self.game_id = None;
        self.player_name = None;
        self.load_on_join = false;
    }

    /// Back to not playing, forgetting the saved session.
    fn reset_session(&mut self) {
        debug!(epoch = self.epoch + 1, "Resetting session");
        self.switch_game();
        self.session.clear();
    }

    fn logged_out(&mut self) {
        self.reset_session();
        self.username = None;
        self.session.clear_token();
    }

    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        self.reconciler.current()
    }

    /// Number of snapshots applied so far.
    pub fn revision(&self) -> u64 {
        self.reconciler.revision()
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref().or(self.username.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn source_required(&self) -> bool {
        self.interaction.source_required()
    }

    pub fn games(&self) -> &GameList {
        &self.games
    }

    pub fn pending_updates(&self) -> usize {
        self.pacing.len()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn channel(&self) -> &C {
        self.connection.channel()
    }

    pub fn channel_mut(&mut self) -> &mut C {
        self.connection.channel_mut()
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    fn own_collection(&self) -> Option<&[ra::Tile]> {
        let name = self.player_name()?;
        let player = self.reconciler.current()?.player(name)?;
        Some(&player.collection)
    }
}
