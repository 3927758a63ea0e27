use alloc::sync::Arc;
use web_time::Instant;

use crate::*;

/// Highest value the elapsed-time counter shows.
pub const MAX_ELAPSED_SECS: u16 = 999;

/// Numbers a status line shows next to the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionStatus {
    pub mines_left: isize,
    pub elapsed_secs: u16,
    pub state: Option<BoardState>,
}

/// One game at a time on top of a board generator, plus the configuration it was started with.
///
/// The board only exists after the first reveal. It is kept behind an [`Arc`] and changed
/// copy-on-write, so snapshots handed out through [`GameSession::board`] or [`GameEvent`]s never
/// change under a reader.
#[derive(Clone, Debug)]
pub struct GameSession<G: BoardGenerator = SeededGenerator> {
    difficulty: Difficulty,
    config: GameConfig,
    preferences: Preferences,
    generator: G,
    board: Option<Arc<Board>>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl GameSession<SeededGenerator> {
    pub fn with_seed(preferences: Preferences, seed: u64) -> Self {
        Self::new(preferences, SeededGenerator::new(seed))
    }
}

impl<G: BoardGenerator> GameSession<G> {
    pub fn new(mut preferences: Preferences, generator: G) -> Self {
        let config = preferences.game_config();
        preferences.set_game_config(config);
        preferences.hold_to_flag_duration_ms = preferences.hold_duration().as_millis().into();

        Self {
            difficulty: Difficulty::of(config),
            config,
            preferences,
            generator,
            board: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn hold_duration(&self) -> HoldDuration {
        self.preferences.hold_duration()
    }

    pub fn show_flag_animation(&self) -> bool {
        self.preferences.show_flag_animation
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Snapshot of the current board, `None` until the first reveal.
    pub fn board(&self) -> Option<Arc<Board>> {
        self.board.clone()
    }

    pub fn is_first_click_pending(&self) -> bool {
        self.board.is_none()
    }

    pub fn is_game_over(&self) -> bool {
        self.board_state() == Some(BoardState::Lost)
    }

    pub fn is_game_won(&self) -> bool {
        self.board_state() == Some(BoardState::Won)
    }

    pub fn is_finished(&self) -> bool {
        self.board_state().is_some_and(BoardState::is_finished)
    }

    pub fn flag_count(&self) -> CellCount {
        self.board.as_ref().map_or(0, |board| board.flag_count())
    }

    pub fn mines_left(&self) -> isize {
        self.board
            .as_ref()
            .map_or(self.config.mines as isize, |board| board.mines_left())
    }

    /// Whole seconds since the first reveal, frozen once the game ends.
    pub fn elapsed_secs(&self, now: Instant) -> u16 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let elapsed = self
            .ended_at
            .unwrap_or(now)
            .saturating_duration_since(started_at)
            .as_secs();
        elapsed.min(MAX_ELAPSED_SECS.into()) as u16
    }

    pub fn status(&self, now: Instant) -> SessionStatus {
        SessionStatus {
            mines_left: self.mines_left(),
            elapsed_secs: self.elapsed_secs(now),
            state: self.board_state(),
        }
    }

    /// Primary action on a cell. The first one generates the board around `coords`; later ones
    /// reveal closed cells and chord opened ones. Flagged cells are left alone.
    pub fn click(&mut self, coords: Coord2, now: Instant) -> Result<GameEvents> {
        if self.is_finished() {
            return Ok(GameEvents::new());
        }

        if self.board.is_none() {
            if coords.0 >= self.config.rows || coords.1 >= self.config.cols {
                log::trace!("first click outside the board at {:?}", coords);
                return Ok(GameEvents::new());
            }
            let board = self.generator.generate(self.config, coords)?;
            self.board = Some(Arc::new(board));
            self.started_at = Some(now);
        }

        let Some(board) = self.board.as_mut() else {
            return Ok(GameEvents::new());
        };
        // snapshots held elsewhere are only copied when the board is about to change
        let outcome = match board.cell(coords).map(|cell| cell.state) {
            Some(CellState::Closed) => Arc::make_mut(board).reveal(coords),
            Some(CellState::Opened) if board.can_chord_reveal_at(coords) => {
                Arc::make_mut(board).chord_reveal(coords)
            }
            Some(_) | None => RevealOutcome::NoChange,
        };

        Ok(self.reveal_events(coords, outcome, now))
    }

    /// Secondary action on a cell. Does nothing before the first reveal or after the game ends.
    pub fn toggle_flag(&mut self, coords: Coord2) -> GameEvents {
        let mut events = GameEvents::new();
        let Some(board) = self.board.as_mut() else {
            log::trace!("flag before first reveal ignored");
            return events;
        };

        let flaggable = !board.is_finished()
            && board.cell(coords).is_some_and(|cell| !cell.is_opened());
        if !flaggable {
            log::trace!("flag ignored at {:?}", coords);
            return events;
        }

        let outcome = Arc::make_mut(board).toggle_flag(coords);
        let board = Arc::clone(board);
        match outcome {
            MarkOutcome::Flagged => events.push(GameEvent::CellFlagged { coords, board }),
            MarkOutcome::Unflagged => events.push(GameEvent::CellUnflagged { coords, board }),
            MarkOutcome::NoChange => {}
        }
        events
    }

    /// Dispatches a resolved gesture.
    pub fn apply(&mut self, intent: Intent, now: Instant) -> Result<GameEvents> {
        match intent {
            Intent::Reveal(coords) => self.click(coords, now),
            Intent::Flag(coords) => Ok(self.toggle_flag(coords)),
        }
    }

    /// Discards the board. The next click starts a new game with the same configuration.
    pub fn reset(&mut self) {
        log::debug!(
            "new game {}x{}/{}",
            self.config.rows,
            self.config.cols,
            self.config.mines
        );
        self.board = None;
        self.started_at = None;
        self.ended_at = None;
    }

    /// Switches to a preset. Choosing `Custom` keeps the current dimensions.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> GameEvents {
        let config = difficulty.preset().unwrap_or(self.config);
        self.change_config(difficulty, config)
    }

    /// Custom dimensions, rejected when they do not fit.
    pub fn set_custom(&mut self, rows: Coord, cols: Coord, mines: CellCount) -> Result<GameEvents> {
        let config = GameConfig::new(rows, cols, mines)?;
        Ok(self.change_config(Difficulty::Custom, config))
    }

    /// Custom dimensions pulled into range, the way numeric inputs behave while being edited.
    pub fn set_custom_clamped(
        &mut self,
        rows: Coord,
        cols: Coord,
        mines: CellCount,
    ) -> GameEvents {
        let config = GameConfig::clamped(rows, cols, mines);
        self.change_config(Difficulty::Custom, config)
    }

    pub fn set_hold_duration(&mut self, ms: u32) -> Result<GameEvents> {
        let hold = HoldDuration::new(ms)?;
        self.preferences.hold_to_flag_duration_ms = hold.as_millis().into();
        Ok(self.config_changed())
    }

    pub fn set_show_flag_animation(&mut self, show: bool) -> GameEvents {
        if self.preferences.show_flag_animation == show {
            return GameEvents::new();
        }
        self.preferences.show_flag_animation = show;
        self.config_changed()
    }

    fn change_config(&mut self, difficulty: Difficulty, config: GameConfig) -> GameEvents {
        self.difficulty = difficulty;
        if self.config == config {
            return GameEvents::new();
        }

        self.config = config;
        self.preferences.set_game_config(config);
        self.reset();
        self.config_changed()
    }

    fn config_changed(&self) -> GameEvents {
        log::debug!("config changed: {:?}", self.preferences);
        let mut events = GameEvents::new();
        events.push(GameEvent::ConfigChanged(self.preferences.clone()));
        events
    }

    fn reveal_events(
        &mut self,
        coords: Coord2,
        outcome: RevealOutcome,
        now: Instant,
    ) -> GameEvents {
        let mut events = GameEvents::new();
        let Some(board) = self.board.clone() else {
            return events;
        };
        if !outcome.has_update() {
            return events;
        }

        events.push(GameEvent::CellOpened {
            coords,
            board: Arc::clone(&board),
        });
        match outcome {
            RevealOutcome::HitMine => events.push(GameEvent::GameOver {
                triggered: board.triggered_mine(),
                board,
            }),
            RevealOutcome::Won => events.push(GameEvent::GameWon { board }),
            RevealOutcome::NoChange | RevealOutcome::Revealed => {}
        }

        if outcome.is_final() {
            self.ended_at = Some(now);
            log::debug!(
                "game {} after {}s",
                if outcome == RevealOutcome::Won { "won" } else { "lost" },
                self.elapsed_secs(now)
            );
        }
        events
    }

    fn board_state(&self) -> Option<BoardState> {
        self.board.as_ref().map(|board| board.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn fixed_session(rows: Coord, cols: Coord, mines: &[Coord2]) -> GameSession<FixedLayout> {
        let prefs = Preferences {
            rows,
            cols,
            mines: mines.len() as CellCount,
            ..Preferences::default()
        };
        GameSession::new(prefs, FixedLayout::new(mines))
    }

    /// (0, 0) is safe but walled in, so the first flood never wins outright.
    const POCKET: &[Coord2] = &[(0, 1), (1, 0)];

    fn secs(start: Instant, secs: u64) -> Instant {
        start + Duration::from_secs(secs)
    }

    #[test]
    fn five_by_five_first_click_wins() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, &[(0, 0), (4, 4)]);
        assert!(session.is_first_click_pending());

        let events = session.click((2, 2), t0).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GameEvent::CellOpened { coords: (2, 2), .. }));
        assert!(matches!(events[1], GameEvent::GameWon { .. }));
        assert!(session.is_game_won());
        assert!(!session.is_game_over());
        assert_eq!(session.elapsed_secs(secs(t0, 30)), 0);
    }

    #[test]
    fn first_click_never_loses() {
        let t0 = Instant::now();
        for seed in 0..64 {
            let mut session = GameSession::with_seed(
                Preferences {
                    rows: 9,
                    cols: 9,
                    mines: 72,
                    ..Preferences::default()
                },
                seed,
            );
            session.click((seed as Coord % 9, 4), t0).unwrap();
            assert!(!session.is_game_over(), "lost on first click with seed {}", seed);
        }
    }

    #[test]
    fn flags_need_a_board() {
        let mut session = fixed_session(5, 5, &[(0, 0), (4, 4)]);

        assert!(session.toggle_flag((0, 0)).is_empty());
        assert_eq!(session.flag_count(), 0);
        assert_eq!(session.mines_left(), 2);
    }

    #[test]
    fn flag_events_and_counts() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        session.click((4, 4), t0).unwrap();

        let events = session.toggle_flag((0, 1));
        assert!(matches!(events[0], GameEvent::CellFlagged { coords: (0, 1), .. }));
        assert_eq!(session.flag_count(), 1);
        assert_eq!(session.mines_left(), 1);

        let events = session.toggle_flag((0, 1));
        assert!(matches!(events[0], GameEvent::CellUnflagged { coords: (0, 1), .. }));
        assert_eq!(session.flag_count(), 0);
    }

    #[test]
    fn clicking_flagged_cell_does_nothing() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        session.click((4, 4), t0).unwrap();
        session.toggle_flag((0, 1));

        assert!(session.click((0, 1), t0).unwrap().is_empty());
        assert!(!session.is_game_over());
    }

    #[test]
    fn clicking_opened_number_chords() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        session.click((4, 4), t0).unwrap();
        let board = session.board().unwrap();
        assert_eq!(board[(1, 1)].adjacent_mines, 2);
        assert!(board[(1, 1)].is_opened());
        assert!(board[(0, 0)].is_closed());

        assert!(session.click((1, 1), t0).unwrap().is_empty());
        session.toggle_flag((0, 1));
        session.toggle_flag((1, 0));
        let events = session.click((1, 1), t0).unwrap();

        assert!(matches!(events[0], GameEvent::CellOpened { coords: (1, 1), .. }));
        assert!(matches!(events[1], GameEvent::GameWon { .. }));
        assert!(session.board().unwrap()[(0, 0)].is_opened());
    }

    #[test]
    fn losing_emits_game_over_and_locks_the_board() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        session.click((4, 4), t0).unwrap();

        let events = session.click((0, 1), secs(t0, 12)).unwrap();

        assert!(matches!(
            events[1],
            GameEvent::GameOver {
                triggered: Some((0, 1)),
                ..
            }
        ));
        assert!(session.is_game_over());
        assert!(!session.is_game_won());
        assert!(session.click((0, 0), t0).unwrap().is_empty());
        assert!(session.toggle_flag((0, 0)).is_empty());
        assert_eq!(session.elapsed_secs(secs(t0, 500)), 12);
    }

    #[test]
    fn elapsed_time_starts_at_first_click_and_caps() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        assert_eq!(session.elapsed_secs(secs(t0, 10)), 0);

        session.click((4, 4), secs(t0, 10)).unwrap();
        assert_eq!(session.elapsed_secs(secs(t0, 15)), 5);
        assert_eq!(session.elapsed_secs(secs(t0, 5000)), MAX_ELAPSED_SECS);
        assert_eq!(session.status(secs(t0, 15)).elapsed_secs, 5);
    }

    #[test]
    fn snapshots_do_not_change_under_readers() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        session.click((4, 4), t0).unwrap();
        let before = session.board().unwrap();

        session.toggle_flag((0, 0));

        assert!(before[(0, 0)].is_closed());
        assert!(session.board().unwrap()[(0, 0)].is_flagged());
    }

    #[test]
    fn ignored_actions_keep_the_shared_board() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        session.click((4, 4), t0).unwrap();
        session.toggle_flag((0, 1));
        let held = session.board().unwrap();

        assert!(session.click((0, 1), t0).unwrap().is_empty());
        assert!(session.click((1, 1), t0).unwrap().is_empty());
        assert!(session.toggle_flag((4, 4)).is_empty());
        assert!(session.toggle_flag((9, 9)).is_empty());

        assert!(Arc::ptr_eq(&held, &session.board().unwrap()));
    }

    #[test]
    fn apply_dispatches_intents() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);

        assert!(session.apply(Intent::Flag((2, 2)), t0).unwrap().is_empty());
        assert!(!session.apply(Intent::Reveal((4, 4)), t0).unwrap().is_empty());
        assert_eq!(session.apply(Intent::Flag((0, 0)), t0).unwrap().len(), 1);
        assert_eq!(session.flag_count(), 1);
    }

    #[test]
    fn invalid_custom_config_is_rejected_before_generation() {
        let mut session = GameSession::with_seed(Preferences::default(), 1);

        assert_eq!(session.set_custom(5, 5, 17).err(), Some(GameError::TooManyMines));
        assert_eq!(session.config(), GameConfig::default());
        assert_eq!(session.difficulty(), Difficulty::Beginner);
    }

    #[test]
    fn config_change_resets_and_reports_preferences() {
        let t0 = Instant::now();
        let mut session = GameSession::with_seed(Preferences::default(), 1);
        session.click((4, 4), t0).unwrap();

        let events = session.set_custom(10, 12, 20).unwrap();

        assert!(session.is_first_click_pending());
        assert_eq!(session.difficulty(), Difficulty::Custom);
        let GameEvent::ConfigChanged(prefs) = &events[0] else {
            panic!("expected a config change, got {:?}", events[0]);
        };
        assert_eq!((prefs.rows, prefs.cols, prefs.mines), (10, 12, 20));
    }

    #[test]
    fn select_difficulty_applies_preset() {
        let mut session = GameSession::with_seed(Preferences::default(), 1);

        assert_eq!(session.select_difficulty(Difficulty::Expert).len(), 1);
        assert_eq!(session.config().size(), (16, 30));
        assert_eq!(session.mines_left(), 99);

        assert!(session.select_difficulty(Difficulty::Custom).is_empty());
        assert_eq!(session.difficulty(), Difficulty::Custom);
        assert_eq!(session.config().mines, 99);
    }

    #[test]
    fn clamped_custom_config_keeps_safe_zone() {
        let mut session = GameSession::with_seed(Preferences::default(), 1);
        session.set_custom_clamped(2, 2, 500);

        assert_eq!(session.config(), GameConfig::new(5, 5, 16).unwrap());
    }

    #[test]
    fn preference_setters_emit_changes() {
        let mut session = GameSession::with_seed(Preferences::default(), 1);

        assert!(session.set_hold_duration(50).is_err());
        assert_eq!(session.set_hold_duration(800).unwrap().len(), 1);
        assert_eq!(session.hold_duration().as_millis(), 800);

        assert!(session.set_show_flag_animation(true).is_empty());
        assert_eq!(session.set_show_flag_animation(false).len(), 1);
        assert!(!session.show_flag_animation());
    }

    #[test]
    fn reset_clears_the_game() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, &[(0, 0), (4, 4)]);
        session.click((2, 2), t0).unwrap();

        session.reset();

        assert!(session.is_first_click_pending());
        assert!(!session.is_game_won());
        assert_eq!(session.elapsed_secs(secs(t0, 3)), 0);
        assert_eq!(session.status(t0).state, None);
    }

    #[test]
    fn resolved_gestures_drive_the_session() {
        let t0 = Instant::now();
        let mut session = fixed_session(5, 5, POCKET);
        let mut recognizer = GestureRecognizer::new(session.hold_duration());

        recognizer.handle(InputEvent::PointerDown {
            id: 1,
            cell: (4, 4),
            kind: PointerKind::Touch,
        });
        let tap = recognizer.handle(InputEvent::PointerUp {
            id: 1,
            cell: (4, 4),
            kind: PointerKind::Touch,
        });
        session.apply(tap.intent().unwrap(), t0).unwrap();
        assert!(!session.is_first_click_pending());

        let Reaction::Schedule(timer) = recognizer.handle(InputEvent::PointerDown {
            id: 2,
            cell: (0, 0),
            kind: PointerKind::Touch,
        }) else {
            panic!("press should schedule a hold timer");
        };
        let hold = recognizer.on_hold_elapsed(&timer).unwrap();
        assert_eq!(hold, Intent::Flag((0, 0)));
        assert_eq!(session.apply(hold, t0).unwrap().len(), 1);
        assert!(session.board().unwrap()[(0, 0)].is_flagged());
    }
}
