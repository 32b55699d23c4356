use crate::config::SyncConfig;
use crate::constants::{
    ghost_location_key, ghost_queue_key, PLAYER_LOCATION_KEY, READY_SENTINEL, SCORE_KEY,
};
use crate::devices::ShadowLink;
use crate::ghost::Ghost;
use crate::shadow::{encode, ShadowDocument};
use crate::transport::{response_body, ShadowRequest};
use crate::types::{SyncPhase, SyncView, Vec2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Idle,
    Started(SyncPhase),
    /// The link refused the request; the phase is retried next cadence.
    Rejected(SyncPhase),
    Waiting,
    Resolved {
        phase: SyncPhase,
        entries: usize,
        /// `(ghost, queue length)` when a poll handed a new queue to a ghost.
        accepted: Option<(usize, usize)>,
    },
    TimedOut(SyncPhase),
}

#[derive(Clone, Copy, Debug)]
pub struct PublishState<'a> {
    pub player: Vec2,
    pub score: u32,
    pub ghosts: &'a [Ghost],
}

#[derive(Clone, Debug)]
pub struct SyncProtocol {
    config: SyncConfig,
    phase: SyncPhase,
    response_pending: bool,
    ticks_since_exchange: u32,
    waited_ticks: u32,
    /// Ghosts whose ready sentinel rides on the publish in flight.
    announcing: Vec<usize>,
}

impl SyncProtocol {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            phase: SyncPhase::Publish,
            response_pending: false,
            ticks_since_exchange: 0,
            waited_ticks: 0,
            announcing: Vec::new(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn response_pending(&self) -> bool {
        self.response_pending
    }

    pub fn selected_ghost(&self) -> usize {
        self.config.selected_ghost
    }

    pub fn select_ghost(&mut self, ghost: usize) {
        self.config.selected_ghost = ghost;
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn view(&self) -> SyncView {
        SyncView {
            phase: self.phase,
            response_pending: self.response_pending,
            selected_ghost: self.config.selected_ghost,
        }
    }

    pub fn publish_document(state: &PublishState<'_>) -> (String, Vec<usize>) {
        let mut pairs = vec![
            (
                PLAYER_LOCATION_KEY.to_string(),
                format!("{} {}", state.player.x, state.player.y),
            ),
            (SCORE_KEY.to_string(), state.score.to_string()),
        ];
        let mut announcing = Vec::new();
        for ghost in state.ghosts {
            pairs.push((
                ghost_location_key(ghost.id),
                format!("{} {}", ghost.pos.x, ghost.pos.y),
            ));
            if ghost.is_ready() {
                pairs.push((ghost_queue_key(ghost.id), READY_SENTINEL.to_string()));
                announcing.push(ghost.id);
            }
        }
        (encode(pairs), announcing)
    }

    pub fn tick(
        &mut self,
        player: Vec2,
        score: u32,
        ghosts: &mut [Ghost],
        link: &mut dyn ShadowLink,
    ) -> SyncOutcome {
        if self.response_pending {
            return self.await_response(ghosts, link);
        }

        self.ticks_since_exchange += 1;
        if self.ticks_since_exchange < self.config.cadence_ticks {
            return SyncOutcome::Idle;
        }
        self.ticks_since_exchange = 0;

        let phase = self.phase;
        let request = match phase {
            SyncPhase::Publish => {
                let state = PublishState {
                    player,
                    score,
                    ghosts: &*ghosts,
                };
                let (document, announcing) = Self::publish_document(&state);
                self.announcing = announcing;
                ShadowRequest::Publish(document)
            }
            SyncPhase::Poll => ShadowRequest::Poll,
        };
        if link.transmit(&request).is_none() {
            self.announcing.clear();
            return SyncOutcome::Rejected(phase);
        }
        self.response_pending = true;
        self.waited_ticks = 0;
        SyncOutcome::Started(phase)
    }

    fn await_response(&mut self, ghosts: &mut [Ghost], link: &mut dyn ShadowLink) -> SyncOutcome {
        self.waited_ticks += 1;
        if let Some(raw) = link.poll_receive() {
            if raw.len() > self.config.min_response_len {
                return self.resolve(&raw, ghosts);
            }
        }
        match self.config.response_timeout_ticks {
            Some(limit) if self.waited_ticks >= limit => {
                let phase = self.finish();
                SyncOutcome::TimedOut(phase)
            }
            _ => SyncOutcome::Waiting,
        }
    }

    fn resolve(&mut self, raw: &[u8], ghosts: &mut [Ghost]) -> SyncOutcome {
        let document = ShadowDocument::decode(&response_body(raw));
        let mut accepted = None;
        match self.phase {
            SyncPhase::Publish => {
                for id in &self.announcing {
                    if let Some(ghost) = ghosts.iter_mut().find(|ghost| ghost.id == *id) {
                        ghost.mark_announced();
                    }
                }
            }
            SyncPhase::Poll => {
                let selected = self.config.selected_ghost;
                if let Some(ghost) = ghosts.iter_mut().find(|ghost| ghost.id == selected) {
                    accepted = document
                        .lookup(&ghost_queue_key(selected))
                        .and_then(|queue| ghost.load_queue(queue))
                        .map(|len| (selected, len));
                }
            }
        }
        let phase = self.finish();
        SyncOutcome::Resolved {
            phase,
            entries: document.len(),
            accepted,
        }
    }

    fn finish(&mut self) -> SyncPhase {
        let phase = self.phase;
        self.phase = phase.next();
        self.response_pending = false;
        self.waited_ticks = 0;
        self.ticks_since_exchange = 0;
        self.announcing.clear();
        phase
    }
}
