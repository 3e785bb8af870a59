use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{NodeId, PresentationTree};
use crate::scheduler::{Scheduler, TaskHandle};

/// A statistic such as `95%` or `1200`, split into its number and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatValue {
    pub target: u64,
    pub suffix: String,
}

impl StatValue {
    /// Accepts digits with an optional fraction and trailing `%`. The fraction is
    /// truncated and values beyond `u64` saturate.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (number, suffix) = match trimmed.strip_suffix('%') {
            Some(number) => (number.trim(), "%"),
            None => (trimmed, ""),
        };
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return None;
        }
        let target = whole.parse().unwrap_or(u64::MAX);
        Some(Self { target, suffix: suffix.to_string() })
    }

    /// Text shown after `tick` of `ticks` frames.
    pub fn frame(&self, tick: u64, ticks: u64) -> String {
        if tick >= ticks {
            format!("{}{}", self.target, self.suffix)
        } else {
            (u128::from(self.target) * u128::from(tick) / u128::from(ticks)).to_string()
        }
    }
}

/// Counts `node` up from zero to `stat` over `duration_ms`.
pub fn animate(
    tree: Rc<dyn PresentationTree>,
    scheduler: Rc<dyn Scheduler>,
    node: NodeId,
    stat: StatValue,
    duration_ms: u32,
    tick_ms: u32,
) -> TaskHandle {
    let ticks = u64::from((duration_ms / tick_ms.max(1)).max(1));
    tree.set_text(node, "0");

    let own_handle: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));
    let weak_tree = Rc::downgrade(&tree);
    let weak_scheduler = Rc::downgrade(&scheduler);
    let slot = own_handle.clone();
    let mut tick = 0;
    let handle = scheduler.every(tick_ms, Box::new(move || {
        tick += 1;
        if let Some(tree) = weak_tree.upgrade() {
            tree.set_text(node, &stat.frame(tick, ticks));
        }
        if tick >= ticks {
            if let (Some(scheduler), Some(handle)) = (weak_scheduler.upgrade(), slot.get()) {
                scheduler.cancel(handle);
            }
        }
    }));
    own_handle.set(Some(handle));
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryTree;
    use crate::scheduler::ManualScheduler;

    #[test]
    fn parses_numbers_and_percentages() {
        assert_eq!(StatValue::parse("95%"), Some(StatValue { target: 95, suffix: "%".to_string() }));
        assert_eq!(StatValue::parse(" 1200 "), Some(StatValue { target: 1200, suffix: String::new() }));
        assert_eq!(StatValue::parse("2.5"), Some(StatValue { target: 2, suffix: String::new() }));
        assert_eq!(StatValue::parse("24/7"), None);
        assert_eq!(StatValue::parse("<5 min"), None);
        assert_eq!(StatValue::parse("1e3"), None);
        assert_eq!(StatValue::parse("-4"), None);
        assert_eq!(StatValue::parse("."), None);
    }

    #[test]
    fn huge_values_saturate_and_interpolate_without_overflow() {
        let stat = StatValue::parse("200000000000000000").unwrap();
        assert_eq!(stat.frame(124, 125), "198400000000000000");

        let saturated = StatValue::parse("99999999999999999999999%").unwrap();
        assert_eq!(saturated.target, u64::MAX);
        assert_eq!(saturated.frame(1, 2), (u64::MAX / 2).to_string());
        assert_eq!(saturated.frame(2, 2), format!("{}%", u64::MAX));
    }

    #[test]
    fn frames_interpolate_and_finish_exactly() {
        let stat = StatValue::parse("95%").unwrap();
        assert_eq!(stat.frame(0, 125), "0");
        assert_eq!(stat.frame(62, 125), "47");
        assert_eq!(stat.frame(124, 125), "94");
        assert_eq!(stat.frame(125, 125), "95%");
    }

    #[test]
    fn counter_runs_for_the_configured_duration() {
        let tree = Rc::new(MemoryTree::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let number = tree.element(tree.body(), "span", &[("class", "stat-number")]);
        tree.set_text(number, "95%");

        animate(tree.clone(), scheduler.clone(), number, StatValue::parse("95%").unwrap(), 2_000, 16);
        assert_eq!(tree.text(number), "0");

        scheduler.advance(1_000);
        assert_eq!(tree.text(number), "47");
        scheduler.advance(984);
        assert_eq!(tree.text(number), "94");
        scheduler.advance(16);
        assert_eq!(tree.text(number), "95%");
        assert_eq!(scheduler.pending(), 0);
    }
}
