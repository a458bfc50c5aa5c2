//! Output registry for multi-board management
//!
//! Owns every board of the application and the bindings declared before any
//! board existed. Bindings declared without a board go to the first board.

use multiout_core::{
    BindingId, BoardId, BoardSettings, OutputError, OutputsConfig, Result,
};
use tracing::{debug, warn};

use crate::binding::{DigitalBinding, OutputBinding};
use crate::output_board::OutputBoard;
use crate::pins::PinIo;
use crate::telemetry::TelemetryLink;

/// Registry managing multiple output boards
pub struct OutputRegistry<P: PinIo> {
    /// Boards in declaration order
    boards: Vec<OutputBoard<P>>,
    /// Bindings declared while no board existed
    orphans: Vec<OutputBinding>,
}

impl<P: PinIo> OutputRegistry<P> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            boards: Vec::new(),
            orphans: Vec::new(),
        }
    }

    /// Build boards and bindings from a configuration
    ///
    /// `make_io` provides the pin I/O of each board, in declaration order.
    pub fn from_config<F>(config: &OutputsConfig, mut make_io: F) -> Result<Self>
    where
        F: FnMut(&BoardSettings) -> P,
    {
        config.validate()?;

        let mut registry = Self::new();
        for settings in &config.boards {
            registry.add_board(OutputBoard::from_settings(make_io(settings), settings));
        }

        for settings in &config.bindings {
            let mut binding = DigitalBinding::new(settings.pin)
                .with_threshold(settings.threshold)
                .with_debug(settings.debug);
            if let Some(signal) = &settings.signal {
                binding.set_signal(signal.clone());
            }
            if settings.inverted {
                binding = binding.inverted();
            }
            registry.add_binding(settings.board.map(BoardId), binding)?;
        }

        Ok(registry)
    }

    /// Register a board, returning its handle
    pub fn add_board(&mut self, board: OutputBoard<P>) -> BoardId {
        self.boards.push(board);
        let id = BoardId(self.boards.len() - 1);
        debug!("Registered output board {}", id.0);
        id
    }

    /// Attach a binding to `board`, or to the first board when `None`
    ///
    /// Returns `Ok(None)` when no board exists yet: the binding is kept as an
    /// orphan and every board will refuse to start.
    pub fn add_binding(
        &mut self,
        board: Option<BoardId>,
        binding: impl Into<OutputBinding>,
    ) -> Result<Option<BindingId>> {
        let binding = binding.into();
        let target = match board.or_else(|| self.first_board()) {
            Some(id) => id,
            None => {
                warn!(
                    "Binding for output {} declared before any output board",
                    binding.pin()
                );
                self.orphans.push(binding);
                return Ok(None);
            }
        };

        let index = self.board_mut_or_err(target)?.attach(binding);
        Ok(Some(BindingId {
            board: target,
            index,
        }))
    }

    /// The first board ever registered
    pub fn first_board(&self) -> Option<BoardId> {
        if self.boards.is_empty() {
            None
        } else {
            Some(BoardId(0))
        }
    }

    pub fn board(&self, id: BoardId) -> Option<&OutputBoard<P>> {
        self.boards.get(id.0)
    }

    pub fn board_mut(&mut self, id: BoardId) -> Option<&mut OutputBoard<P>> {
        self.boards.get_mut(id.0)
    }

    /// Get a board, returning an error if not found
    pub fn board_mut_or_err(&mut self, id: BoardId) -> Result<&mut OutputBoard<P>> {
        self.boards
            .get_mut(id.0)
            .ok_or(OutputError::BoardNotFound(id.0))
    }

    pub fn binding(&self, id: BindingId) -> Option<&OutputBinding> {
        self.board(id.board)?.binding(id.index)
    }

    /// Bindings declared before any board
    pub fn orphans(&self) -> &[OutputBinding] {
        &self.orphans
    }

    pub fn boards(&self) -> impl Iterator<Item = &OutputBoard<P>> {
        self.boards.iter()
    }

    /// Get the number of registered boards
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Start one board
    pub fn begin<L: TelemetryLink + ?Sized>(&mut self, id: BoardId, link: &mut L) -> Result<()> {
        let orphans = self.orphans.len();
        self.board_mut_or_err(id)?.begin_checked(link, orphans)
    }

    /// Start every board
    ///
    /// A failing board does not prevent the others from starting; the first
    /// failure is returned.
    pub fn begin_all<L: TelemetryLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let orphans = self.orphans.len();
        let mut first_error = None;
        for board in &mut self.boards {
            if let Err(e) = board.begin_checked(link, orphans) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drain the link's pending changes into the bindings of every board
    pub fn poll<L: TelemetryLink + ?Sized>(&mut self, link: &mut L) {
        let boards = &mut self.boards;
        link.poll_updates(&mut |handle, value| {
            for board in boards.iter_mut() {
                board.dispatch(handle, value);
            }
        });
    }

    /// One control cycle for every board
    ///
    /// The link is polled once and its changes reach bindings on all boards
    /// before each board checks connectivity and flushes.
    pub fn tick<L: TelemetryLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        self.poll(link);

        let mut first_error = None;
        for board in &mut self.boards {
            if let Err(e) = board.tick(&*link) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// One control cycle for a single board
    ///
    /// Changes drained by the poll still reach every board; the others latch
    /// them on their own tick.
    pub fn tick_board<L: TelemetryLink + ?Sized>(&mut self, id: BoardId, link: &mut L) -> Result<()> {
        self.board_mut_or_err(id)?;
        self.poll(link);
        self.board_mut_or_err(id)?.tick(&*link)
    }
}

impl<P: PinIo> Default for OutputRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
