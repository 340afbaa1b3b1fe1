// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity browser: search, year filter and pagination over runs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{Activity, CardSummary};

pub const ITEMS_PER_PAGE: usize = 12;

/// Year filter value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    /// `"all"` or empty means no filter; anything else must be a year.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Some(YearFilter::All),
            Some(year) => year.parse().ok().map(YearFilter::Year),
        }
    }

    fn matches(self, activity: &Activity) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Year(year) => activity.start_year() == Some(year),
        }
    }
}

/// Browser state. Changing the search text or the year returns to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
    query: String,
    year: YearFilter,
    page: usize,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            query: String::new(),
            year: YearFilter::All,
            page: 1,
        }
    }
}

impl BrowseState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn year(&self) -> YearFilter {
        self.year
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_query(&mut self, query: &str) {
        if self.query != query {
            self.query = query.to_string();
            self.page = 1;
        }
    }

    pub fn set_year(&mut self, year: YearFilter) {
        if self.year != year {
            self.year = year;
            self.page = 1;
        }
    }

    /// Pages are 1-based; 0 is treated as 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Case-insensitive substring match on the name, plus the year filter.
    pub fn matches(&self, activity: &Activity) -> bool {
        let needle = self.query.to_lowercase();
        activity.name.to_lowercase().contains(&needle) && self.year.matches(activity)
    }

    /// Filter and slice `activities` for the current page.
    pub fn apply<'a>(&self, activities: &'a [Activity]) -> BrowsePage<'a> {
        let filtered: Vec<&Activity> = activities.iter().filter(|a| self.matches(a)).collect();
        let total = filtered.len();
        let start = (self.page - 1).saturating_mul(ITEMS_PER_PAGE);
        let items = filtered
            .into_iter()
            .skip(start)
            .take(ITEMS_PER_PAGE)
            .collect();

        BrowsePage {
            items,
            total,
            total_pages: total_pages(total),
            page: self.page,
        }
    }
}

/// One page of filtered activities.
#[derive(Debug)]
pub struct BrowsePage<'a> {
    pub items: Vec<&'a Activity>,
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
}

pub fn total_pages(total: usize) -> usize {
    total.div_ceil(ITEMS_PER_PAGE)
}

/// Distinct local start years, newest first.
pub fn available_years(activities: &[Activity]) -> Vec<i32> {
    let years: BTreeSet<i32> = activities.iter().filter_map(Activity::start_year).collect();
    years.into_iter().rev().collect()
}

/// Browser response body.
#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub activities: Vec<CardSummary>,
    pub available_years: Vec<i32>,
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
    /// Sum over all filtered runs, kilometers with one decimal.
    pub total_distance: String,
    /// Sum over all filtered runs, whole meters.
    pub total_elevation: i64,
}

impl BrowseResponse {
    pub fn build(state: &BrowseState, activities: &[Activity]) -> Self {
        let page = state.apply(activities);
        let (distance, elevation) = activities
            .iter()
            .filter(|a| state.matches(a))
            .fold((0.0, 0.0), |(d, e), a| {
                (d + a.distance, e + a.total_elevation_gain)
            });

        Self {
            activities: page.items.iter().map(|a| CardSummary::from_activity(a)).collect(),
            available_years: available_years(activities),
            total: page.total,
            total_pages: page.total_pages,
            page: page.page,
            total_distance: crate::format::format_distance(distance),
            total_elevation: elevation.round() as i64,
        }
    }
}
