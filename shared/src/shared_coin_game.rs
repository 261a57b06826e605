use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::COINS_KEY;
use crate::storage::KeyValueStore;

pub const TOKEN_SIZE: f64 = 44.0;
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 80;
pub const FALLBACK_POSITION: (f64, f64) = (24.0, 100.0);

/// Persisted coin balance. Never negative; written back after every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wallet {
    balance: u32,
}

impl Wallet {
    /// Reads the stored balance, defaulting to 0 when missing or unparsable.
    pub fn load(store: &impl KeyValueStore) -> Self {
        let balance = store
            .get(COINS_KEY)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0);
        Self { balance }
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        store.set(COINS_KEY, &self.balance.to_string());
    }

    pub fn credit(&mut self, amount: u32, store: &mut impl KeyValueStore) -> u32 {
        self.balance = self.balance.saturating_add(amount);
        self.save(store);
        self.balance
    }

    /// Takes `amount` if the balance covers it. On refusal nothing changes
    /// and nothing is written.
    pub fn try_debit(&mut self, amount: u32, store: &mut impl KeyValueStore) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        self.save(store);
        true
    }
}

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    /// Edges that touch count as overlapping.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Number of candidates tried; equal to `MAX_PLACEMENT_ATTEMPTS` when the
    /// fallback corner was used.
    pub attempts: u32,
}

impl Placement {
    pub fn used_fallback(&self) -> bool {
        self.attempts >= MAX_PLACEMENT_ATTEMPTS
    }
}

/// Picks a token position that stays clear of the page chrome. Small
/// viewports get a narrower right margin and a taller bottom margin.
pub fn place_token<R: Rng + ?Sized>(viewport: Viewport, exclusions: &[Rect], rng: &mut R) -> Placement {
    let margin_right = if viewport.width < 420.0 { 60.0 } else { 220.0 };
    let margin_bottom = if viewport.height < 600.0 { 180.0 } else { 140.0 };
    let span_x = (viewport.width - margin_right - 80.0).max(20.0);
    let span_y = (viewport.height - margin_bottom).max(20.0);

    for attempt in 0..MAX_PLACEMENT_ATTEMPTS {
        let x = (rng.gen::<f64>() * span_x).floor() + 20.0;
        let y = (rng.gen::<f64>() * span_y).floor() + 60.0;
        let candidate = Rect::new(x, y, TOKEN_SIZE, TOKEN_SIZE);
        if !exclusions.iter().any(|r| candidate.intersects(r)) {
            return Placement { x, y, attempts: attempt + 1 };
        }
    }

    Placement {
        x: FALLBACK_POSITION.0,
        y: FALLBACK_POSITION.1,
        attempts: MAX_PLACEMENT_ATTEMPTS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Live,
    Collected,
}

/// Tracks every token currently on screen. `collect` succeeds at most once per
/// token; a token that was collected can no longer expire.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    next_id: u32,
    tokens: HashMap<TokenId, TokenState>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> TokenId {
        self.next_id += 1;
        let id = TokenId(self.next_id);
        self.tokens.insert(id, TokenState::Live);
        id
    }

    pub fn state(&self, id: TokenId) -> Option<TokenState> {
        self.tokens.get(&id).copied()
    }

    pub fn collect(&mut self, id: TokenId) -> bool {
        match self.tokens.get_mut(&id) {
            Some(state) if *state == TokenState::Live => {
                *state = TokenState::Collected;
                true
            }
            _ => false,
        }
    }

    /// Drops an uncollected token whose lifetime ran out.
    pub fn expire(&mut self, id: TokenId) -> bool {
        if self.tokens.get(&id) == Some(&TokenState::Live) {
            self.tokens.remove(&id);
            true
        } else {
            false
        }
    }

    /// Forgets a collected token once its exit transition has finished.
    pub fn discard(&mut self, id: TokenId) {
        if self.tokens.get(&id) == Some(&TokenState::Collected) {
            self.tokens.remove(&id);
        }
    }

    pub fn live_count(&self) -> usize {
        self.tokens.values().filter(|s| **s == TokenState::Live).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_wallet_load_defaults() {
        assert_eq!(Wallet::load(&MemoryStore::new()).balance(), 0);
        let junk = MemoryStore::new().with_entry(COINS_KEY, "abc");
        assert_eq!(Wallet::load(&junk).balance(), 0);
        let negative = MemoryStore::new().with_entry(COINS_KEY, "-4");
        assert_eq!(Wallet::load(&negative).balance(), 0);
    }

    #[test]
    fn test_wallet_round_trip() {
        let mut store = MemoryStore::new();
        let mut wallet = Wallet::load(&store);
        wallet.credit(7, &mut store);
        assert_eq!(Wallet::load(&store).balance(), 7);
    }

    #[test]
    fn test_debit_refused_without_funds() {
        let mut store = MemoryStore::new();
        let mut wallet = Wallet::load(&store);
        assert!(!wallet.try_debit(1, &mut store));
        assert_eq!(wallet.balance(), 0);
        assert_eq!(store.get(COINS_KEY), None);
    }

    #[test]
    fn test_rect_touching_edges_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(10.5, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_placement_avoids_exclusions() {
        let mut rng = StdRng::seed_from_u64(11);
        let viewport = Viewport { width: 1280.0, height: 800.0 };
        let chrome = [Rect::new(300.0, 100.0, 600.0, 500.0), Rect::new(0.0, 0.0, 1280.0, 70.0)];
        for _ in 0..100 {
            let p = place_token(viewport, &chrome, &mut rng);
            assert!(!p.used_fallback());
            let rect = Rect::new(p.x, p.y, TOKEN_SIZE, TOKEN_SIZE);
            assert!(chrome.iter().all(|r| !rect.intersects(r)));
            assert!(p.x >= 20.0 && p.x < 20.0 + 1280.0 - 300.0);
            assert!(p.y >= 60.0 && p.y < 60.0 + 800.0 - 140.0);
        }
    }

    #[test]
    fn test_placement_margins_on_small_viewport() {
        let mut rng = StdRng::seed_from_u64(23);
        let phone = Viewport { width: 400.0, height: 500.0 };
        let mut widest = 0.0_f64;
        for _ in 0..200 {
            let p = place_token(phone, &[], &mut rng);
            assert_eq!(p.attempts, 1);
            assert!(p.x >= 20.0 && p.x < 20.0 + (400.0_f64 - 60.0 - 80.0).max(20.0));
            assert!(p.y >= 60.0 && p.y < 60.0 + (500.0_f64 - 180.0).max(20.0));
            widest = widest.max(p.x);
        }
        // only reachable with the narrow right margin
        assert!(widest >= 220.0);

        let tablet = Viewport { width: 500.0, height: 900.0 };
        for _ in 0..200 {
            let p = place_token(tablet, &[], &mut rng);
            assert!(p.x >= 20.0 && p.x < 20.0 + (500.0_f64 - 220.0 - 80.0).max(20.0));
            assert!(p.y >= 60.0 && p.y < 60.0 + (900.0_f64 - 140.0));
        }

        let tiny = Viewport { width: 300.0, height: 150.0 };
        for _ in 0..50 {
            let p = place_token(tiny, &[], &mut rng);
            assert!(p.x >= 20.0 && p.x < 20.0 + 160.0);
            assert!(p.y >= 60.0 && p.y < 80.0);
        }
    }

    #[test]
    fn test_placement_falls_back_when_covered() {
        let mut rng = StdRng::seed_from_u64(5);
        let viewport = Viewport { width: 390.0, height: 500.0 };
        let everything = [Rect::new(-100.0, -100.0, 2000.0, 2000.0)];
        let p = place_token(viewport, &everything, &mut rng);
        assert!(p.used_fallback());
        assert_eq!((p.x, p.y), FALLBACK_POSITION);
    }

    #[test]
    fn test_collect_at_most_once() {
        let mut registry = TokenRegistry::new();
        let id = registry.spawn();
        assert!(registry.collect(id));
        assert!(!registry.collect(id));
        assert!(!registry.expire(id));
        registry.discard(id);
        assert_eq!(registry.state(id), None);
        assert!(!registry.collect(id));
    }

    #[test]
    fn test_expire_only_live_tokens() {
        let mut registry = TokenRegistry::new();
        let a = registry.spawn();
        let b = registry.spawn();
        assert_ne!(a, b);
        assert!(registry.expire(a));
        assert!(!registry.collect(a));
        assert_eq!(registry.live_count(), 1);
    }
}
