//! The Mock Policy Engine (spec §4.2): decides, for a resolution,
//! whether mock or real is delivered.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::JsResult;
use crate::module_id::{ModuleId, ResolutionKind};
use crate::resolver::Resolver;

/// A per-`ModuleID` explicit override, installed by the runtime API's
/// `mock`/`dontMock`/`setMock` (spec §3's `ShouldMockDecision` row).
///
/// Not cleared by registry reset (spec §3, §9's third Open Question);
/// this crate follows the spec's stated default rather than the
/// "maybe users expect otherwise" alternative it flags as undecided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldMockDecision {
    /// No explicit override installed.
    Unset,
    /// `jest.mock(name)` was called for this identity.
    ForceMock,
    /// `jest.dontMock(name)` was called for this identity.
    ForceReal,
}

/// Decides real vs. mock for a resolved import (spec §4.2).
pub struct MockPolicyEngine {
    resolver: Rc<Resolver>,
    automock: Cell<bool>,
    overrides: RefCell<HashMap<ModuleId, ShouldMockDecision>>,
    /// Keyed by requested name, not `ModuleID` (spec §4.2: "identical
    /// names from different importers share policy").
    should_mock_cache: RefCell<HashMap<String, bool>>,
}

impl MockPolicyEngine {
    /// Builds an engine whose default auto-mock state is the resolver's
    /// configured default.
    #[must_use]
    pub fn new(resolver: Rc<Resolver>) -> Self {
        let automock = resolver.config().automock;
        Self {
            resolver,
            automock: Cell::new(automock),
            overrides: RefCell::new(HashMap::new()),
            should_mock_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Toggles the global auto-mock default (`jest.autoMockOn/Off`).
    pub fn set_automock(&self, enabled: bool) {
        self.automock.set(enabled);
    }

    /// Returns the current global auto-mock state.
    #[must_use]
    pub fn automock(&self) -> bool {
        self.automock.get()
    }

    /// Installs an explicit override for a resolved identity
    /// (`jest.mock`/`jest.dontMock`/`setMock`'s force-mock half).
    pub fn set_override(&self, id: ModuleId, decision: ShouldMockDecision) {
        self.overrides.borrow_mut().insert(id, decision);
    }

    /// Resolves `requested` from `importer` and decides whether the
    /// mock or the real branch should be delivered.
    ///
    /// # Errors
    /// Propagates the [`Resolver`]'s error when every resolution
    /// strategy is exhausted.
    pub fn should_mock(&self, importer: &Path, requested: &str) -> JsResult<(ModuleId, bool)> {
        let id = self.resolver.resolve(importer, requested)?;

        if let Some(decision) = self.overrides.borrow().get(&id) {
            match decision {
                ShouldMockDecision::ForceMock => return Ok((id, true)),
                ShouldMockDecision::ForceReal => return Ok((id, false)),
                ShouldMockDecision::Unset => {}
            }
        }

        if id.kind == ResolutionKind::Core {
            return Ok((id, false));
        }

        if !self.automock.get() {
            return Ok((id, false));
        }

        if let Some(&cached) = self.should_mock_cache.borrow().get(requested) {
            return Ok((id, cached));
        }

        let config = self.resolver.config();
        if config.unmocked_module_path_patterns.is_empty() {
            return Ok((id, true));
        }

        // Resolution succeeded but found only a manual mock, no real
        // file: nothing to compare against unmock patterns.
        if id.real_path.is_none() && id.mock_path.is_some() {
            return Ok((id, true));
        }

        let Some(real_path) = id.real_path.as_deref() else {
            return Ok((id, true));
        };

        if let Some(vendor) = &config.vendor_path {
            if real_path.starts_with(vendor) {
                self.should_mock_cache
                    .borrow_mut()
                    .insert(requested.to_owned(), false);
                return Ok((id, false));
            }
        }

        let canonical = std::fs::canonicalize(real_path).unwrap_or_else(|_| real_path.to_path_buf());
        let is_real = config.unmocked_module_path_patterns.iter().any(|pattern| {
            pattern.is_match(&real_path.to_string_lossy()) || pattern.is_match(&canonical.to_string_lossy())
        });

        log::debug!("caching should-mock decision for '{requested}': mock={}", !is_real);
        self.should_mock_cache
            .borrow_mut()
            .insert(requested.to_owned(), !is_real);
        Ok((id, !is_real))
    }
}
