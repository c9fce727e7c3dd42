use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::columns::Family;

// ---------------------------------------------------------------------------
// Family filter: which tank families take part in an analysis
// ---------------------------------------------------------------------------

/// Independent inclusion flags per family. Default includes everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyFilter {
    pub fst: bool,
    pub bbt: bool,
    pub rbt: bool,
}

impl Default for FamilyFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl FamilyFilter {
    pub fn all() -> Self {
        Self {
            fst: true,
            bbt: true,
            rbt: true,
        }
    }

    pub fn admits(&self, family: Family) -> bool {
        match family {
            Family::Fst => self.fst,
            Family::Bbt => self.bbt,
            Family::Rbt => self.rbt,
        }
    }

    /// Mutable flag for a family, for checkbox widgets.
    pub fn flag_mut(&mut self, family: Family) -> &mut bool {
        match family {
            Family::Fst => &mut self.fst,
            Family::Bbt => &mut self.bbt,
            Family::Rbt => &mut self.rbt,
        }
    }
}

// ---------------------------------------------------------------------------
// Time window: inclusive bounds on the row timestamp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl TimeWindow {
    /// No bounds: every row passes.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }

    /// `[day 00:00:00, day 23:59:59]`
    pub fn day(date: NaiveDate) -> Self {
        Self {
            from: Some(date.and_time(NaiveTime::MIN)),
            to: date.and_hms_opt(23, 59, 59),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Whether a row passes the window.
    ///
    /// A row passes when:
    /// * the dataset has no Time column → passes (filtering is disabled)
    /// * no bound is set → passes
    /// * the row has no parseable timestamp → fails
    /// * otherwise the timestamp must lie within `[from, to]`
    pub fn admits(&self, has_time_column: bool, timestamp: Option<NaiveDateTime>) -> bool {
        if !has_time_column || !self.is_bounded() {
            return true;
        }
        let Some(ts) = timestamp else {
            return false;
        };
        if self.from.is_some_and(|from| ts < from) {
            return false;
        }
        if self.to.is_some_and(|to| ts > to) {
            return false;
        }
        true
    }
}
