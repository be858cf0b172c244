//! Local view state and the pure filtered/sorted projection of the item list.

use sc_api_types::{Item, Step};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterTab {
    #[default]
    All,
    Pending,
    Delivered,
}

impl FilterTab {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(FilterTab::All),
            "pending" => Some(FilterTab::Pending),
            "delivered" => Some(FilterTab::Delivered),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterTab::All => "all",
            FilterTab::Pending => "pending",
            FilterTab::Delivered => "delivered",
        }
    }

    pub fn admits(self, step: Step) -> bool {
        match self {
            FilterTab::All => true,
            FilterTab::Pending => step == Step::Created,
            FilterTab::Delivered => step == Step::Delivered,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Index,
    Name,
    Price,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "index" => Some(SortKey::Index),
            "name" => Some(SortKey::Name),
            "price" => Some(SortKey::Price),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Index => "index",
            SortKey::Name => "name",
            SortKey::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Text the user has typed but not yet submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftForm {
    pub item_name: String,
    pub cost: String,
    pub index: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub draft: DraftForm,
    pub tab: FilterTab,
    pub search_text: String,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl ViewState {
    /// Same key flips the order; a new key starts ascending.
    pub fn select_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_key = key;
            self.sort_order = SortOrder::Asc;
        }
    }
}

pub fn compute_visible_items(items: &[Item], view: &ViewState) -> Vec<Item> {
    let needle = view.search_text.to_lowercase();

    let mut visible: Vec<Item> = items
        .iter()
        .filter(|item| view.tab.admits(item.step))
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    // stable: equal keys keep their original relative order in both directions
    visible.sort_by(|a, b| {
        let ordering = match view.sort_key {
            SortKey::Index => a.index.cmp(&b.index),
            SortKey::Name => natural_cmp(&a.name, &b.name),
            SortKey::Price => a.price.cmp(&b.price),
        };
        match view.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    visible
}

/// Case-insensitive ordering where digit runs compare by numeric value,
/// so "crate 9" sorts before "crate 10".
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_trimmed = l_run.trim_start_matches('0');
                let r_trimmed = r_run.trim_start_matches('0');
                let ordering = l_trimmed
                    .len()
                    .cmp(&r_trimmed.len())
                    .then_with(|| l_trimmed.cmp(r_trimmed));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        run.push(c);
    }
    run
}
