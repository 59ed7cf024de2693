//! Pivot grids: flat records reshaped into group → item → day-of-month cells
//!
//! Every grid is built bottom-up. Child cells are filled from records,
//! group cells are the sum of child cells, and table cells are the sum of
//! group cells. Nothing is ever recomputed from the top, so a group's
//! totals always equal the sum of its children.

use crate::models::TransactionRecord;
use crate::time::CalendarMonth;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// Amount per day of month; every day of the month has an entry
pub type DayAmounts = BTreeMap<u32, Decimal>;

fn zero_days(month: CalendarMonth) -> DayAmounts {
    month.days().map(|day| (day, Decimal::ZERO)).collect()
}

/// Leaf row: one record, or several records sharing a sub-key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotChild {
    pub key: String,
    pub description: String,
    pub amounts_by_day: DayAmounts,
    pub total: Decimal,
    /// Records that contributed to this row
    pub record_ids: Vec<i64>,
}

/// Top-level row aggregating one group (budget item, category, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotGroup {
    pub key: String,
    pub label: String,
    pub children: Vec<PivotChild>,
    pub totals_by_day: DayAmounts,
    pub total: Decimal,
}

impl PivotGroup {
    fn from_children(label: String, children: Vec<PivotChild>, month: CalendarMonth) -> Self {
        let mut totals_by_day = zero_days(month);
        for child in &children {
            for (day, amount) in &child.amounts_by_day {
                *totals_by_day.entry(*day).or_insert(Decimal::ZERO) += *amount;
            }
        }
        let total: Decimal = children.iter().map(|c| c.total).sum();

        debug_assert_eq!(
            total,
            totals_by_day.values().copied().sum::<Decimal>(),
            "group {} day totals disagree with child totals",
            label
        );

        Self {
            key: label.clone(),
            label,
            children,
            totals_by_day,
            total,
        }
    }
}

struct ChildBuilder {
    key: String,
    description: String,
    cells: DayAmounts,
    record_ids: Vec<i64>,
}

impl ChildBuilder {
    fn finish(self) -> PivotChild {
        let total = self.cells.values().copied().sum();
        PivotChild {
            key: self.key,
            description: self.description,
            amounts_by_day: self.cells,
            total,
            record_ids: self.record_ids,
        }
    }
}

struct GroupBuilder {
    label: String,
    children: Vec<ChildBuilder>,
    sub_key_index: HashMap<String, usize>,
}

/// Reshape `records` into day-by-day group rows for `month`.
///
/// Groups appear in first-seen order. `child_key` returning `None` makes one
/// child per record; `Some(key)` folds every record with that key into a
/// single child. Records dated outside `month` are skipped.
pub fn transform<G, C>(
    records: &[TransactionRecord],
    month: CalendarMonth,
    group_key: G,
    child_key: C,
) -> Vec<PivotGroup>
where
    G: Fn(&TransactionRecord) -> String,
    C: Fn(&TransactionRecord) -> Option<String>,
{
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if !month.contains(record.date) {
            log::debug!(
                "pivot: record {} dated {} is outside {}, skipped",
                record.id,
                record.date,
                month
            );
            continue;
        }

        let label = group_key(record);
        let gi = *group_index.entry(label.clone()).or_insert_with(|| {
            groups.push(GroupBuilder {
                label: label.clone(),
                children: Vec::new(),
                sub_key_index: HashMap::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[gi];

        let children = &mut group.children;
        let ci = match child_key(record) {
            // Only sub-keyed rows are indexed; a per-record row is always new
            Some(sub_key) => *group.sub_key_index.entry(sub_key.clone()).or_insert_with(|| {
                children.push(ChildBuilder {
                    key: format!("{}/{}", label, sub_key),
                    description: sub_key,
                    cells: zero_days(month),
                    record_ids: Vec::new(),
                });
                children.len() - 1
            }),
            None => {
                children.push(ChildBuilder {
                    key: format!("{}/{}", label, record.id),
                    description: record.description.clone(),
                    cells: zero_days(month),
                    record_ids: Vec::new(),
                });
                children.len() - 1
            }
        };

        let child = &mut children[ci];
        *child.cells.entry(record.date.day()).or_insert(Decimal::ZERO) += record.amount;
        child.record_ids.push(record.id);
    }

    groups
        .into_iter()
        .map(|g| {
            let children = g.children.into_iter().map(ChildBuilder::finish).collect();
            PivotGroup::from_children(g.label, children, month)
        })
        .collect()
}

/// Group by budget item name
pub fn by_budget_item(record: &TransactionRecord) -> String {
    record.budget_item_name.clone()
}

/// Group by category label
pub fn by_category(record: &TransactionRecord) -> String {
    record.category.clone()
}

/// One child row per record
pub fn per_record(_record: &TransactionRecord) -> Option<String> {
    None
}

/// Fold records with the same description into one child row
pub fn by_description(record: &TransactionRecord) -> Option<String> {
    Some(record.description.clone())
}

/// A month's grid with column totals and the grand total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub month: CalendarMonth,
    pub groups: Vec<PivotGroup>,
    pub totals_by_day: DayAmounts,
    pub grand_total: Decimal,
}

impl PivotTable {
    pub fn build<G, C>(
        records: &[TransactionRecord],
        month: CalendarMonth,
        group_key: G,
        child_key: C,
    ) -> Self
    where
        G: Fn(&TransactionRecord) -> String,
        C: Fn(&TransactionRecord) -> Option<String>,
    {
        Self::from_groups(month, transform(records, month, group_key, child_key))
    }

    pub fn from_groups(month: CalendarMonth, groups: Vec<PivotGroup>) -> Self {
        let mut totals_by_day = zero_days(month);
        for group in &groups {
            for (day, amount) in &group.totals_by_day {
                *totals_by_day.entry(*day).or_insert(Decimal::ZERO) += *amount;
            }
        }
        let grand_total = groups.iter().map(|g| g.total).sum();

        Self {
            month,
            groups,
            totals_by_day,
            grand_total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Days that carry a non-zero amount somewhere in the grid
    pub fn active_days(&self) -> Vec<u32> {
        let mut days: Vec<u32> = self
            .groups
            .iter()
            .flat_map(|g| g.children.iter())
            .flat_map(|c| c.amounts_by_day.iter())
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(day, _)| *day)
            .collect();
        days.sort_unstable();
        days.dedup();
        days
    }
}

fn fingerprint(records: &[TransactionRecord]) -> u64 {
    let mut hasher = DefaultHasher::new();
    records.hash(&mut hasher);
    hasher.finish()
}

/// Caches the last grid built for a `(records, month)` pair
pub struct PivotMemo<G, C> {
    group_key: G,
    child_key: C,
    cached: Option<(u64, CalendarMonth, PivotTable)>,
    builds: usize,
}

impl<G, C> PivotMemo<G, C>
where
    G: Fn(&TransactionRecord) -> String,
    C: Fn(&TransactionRecord) -> Option<String>,
{
    pub fn new(group_key: G, child_key: C) -> Self {
        Self {
            group_key,
            child_key,
            cached: None,
            builds: 0,
        }
    }

    /// Grid for `records` in `month`, rebuilt only when either changed
    pub fn table(&mut self, records: &[TransactionRecord], month: CalendarMonth) -> &PivotTable {
        let fp = fingerprint(records);
        let cached = match self.cached.take() {
            Some(entry) if entry.0 == fp && entry.1 == month => entry,
            _ => {
                self.builds += 1;
                let table = PivotTable::build(records, month, &self.group_key, &self.child_key);
                (fp, month, table)
            }
        };
        &self.cached.insert(cached).2
    }

    /// How many times a grid was actually built
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(id: i64, date: &str, item: &str, amount: &str) -> TransactionRecord {
        TransactionRecord {
            id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            amount: dec(amount),
            category: "Gider".to_string(),
            budget_item_name: item.to_string(),
            description: format!("record {}", id),
            currency: "TRY".to_string(),
        }
    }

    fn july() -> CalendarMonth {
        "2025-07".parse().unwrap()
    }

    fn assert_group_invariants(groups: &[PivotGroup], month: CalendarMonth) {
        for group in groups {
            let child_sum: Decimal = group.children.iter().map(|c| c.total).sum();
            assert_eq!(group.total, child_sum, "group {}", group.label);
            for day in month.days() {
                let day_sum: Decimal = group.children.iter().map(|c| c.amounts_by_day[&day]).sum();
                assert_eq!(group.totals_by_day[&day], day_sum, "group {} day {}", group.label, day);
            }
        }
    }

    #[test]
    fn test_office_and_vehicle_scenario() {
        let records = vec![
            record(1, "2025-07-08", "Ofis", "100"),
            record(2, "2025-07-08", "Ofis", "50"),
            record(3, "2025-07-20", "Araç", "30"),
        ];

        let table = PivotTable::build(&records, july(), by_budget_item, per_record);

        assert_eq!(table.groups.len(), 2);
        let office = &table.groups[0];
        assert_eq!(office.label, "Ofis");
        assert_eq!(office.total, dec("150"));
        assert_eq!(office.totals_by_day[&8], dec("150"));
        assert_eq!(office.children.len(), 2);

        let vehicle = &table.groups[1];
        assert_eq!(vehicle.label, "Araç");
        assert_eq!(vehicle.total, dec("30"));
        assert_eq!(vehicle.totals_by_day[&20], dec("30"));

        assert_eq!(table.grand_total, dec("180"));
        assert_eq!(table.totals_by_day[&8], dec("150"));
        assert_eq!(table.active_days(), vec![8, 20]);
    }

    #[test]
    fn test_empty_input_gives_no_rows() {
        assert!(transform(&[], july(), by_budget_item, per_record).is_empty());
        assert!(PivotTable::build(&[], july(), by_budget_item, per_record).is_empty());
    }

    #[test]
    fn test_every_day_of_month_present() {
        let records = vec![record(1, "2025-07-31", "Ofis", "12.5")];
        let groups = transform(&records, july(), by_budget_item, per_record);

        let child = &groups[0].children[0];
        assert_eq!(child.amounts_by_day.len(), 31);
        assert_eq!(child.amounts_by_day[&1], Decimal::ZERO);
        assert_eq!(child.amounts_by_day[&31], dec("12.5"));
    }

    #[test]
    fn test_records_outside_month_are_ignored() {
        let records = vec![
            record(1, "2025-06-30", "Kira", "999"),
            record(2, "2025-07-01", "Ofis", "10"),
        ];
        let groups = transform(&records, july(), by_budget_item, per_record);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Ofis");
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            record(1, "2025-07-03", "Zeta", "1"),
            record(2, "2025-07-02", "Alfa", "1"),
            record(3, "2025-07-01", "Zeta", "1"),
        ];
        let labels: Vec<_> = transform(&records, july(), by_budget_item, per_record)
            .into_iter()
            .map(|g| g.label)
            .collect();

        assert_eq!(labels, vec!["Zeta", "Alfa"]);
    }

    #[test]
    fn test_sub_key_aggregates_children() {
        let mut a = record(1, "2025-07-05", "Banka", "200");
        a.description = "Garanti".to_string();
        let mut b = record(2, "2025-07-05", "Banka", "-50");
        b.description = "Garanti".to_string();
        let mut c = record(3, "2025-07-06", "Banka", "75");
        c.description = "Ziraat".to_string();

        let groups = transform(&[a, b, c], july(), by_budget_item, by_description);
        let bank = &groups[0];

        assert_eq!(bank.children.len(), 2);
        assert_eq!(bank.children[0].key, "Banka/Garanti");
        assert_eq!(bank.children[0].total, dec("150"));
        assert_eq!(bank.children[0].record_ids, vec![1, 2]);
        assert_eq!(bank.total, dec("225"));
        assert_group_invariants(&groups, july());
    }

    #[test]
    fn test_repeated_record_ids_stay_separate_rows() {
        let records = vec![
            record(5, "2025-07-02", "Ofis", "100"),
            record(5, "2025-07-03", "Ofis", "50"),
        ];
        let groups = transform(&records, july(), by_budget_item, per_record);

        assert_eq!(groups[0].children.len(), 2);
        assert_eq!(groups[0].children[0].total, dec("100"));
        assert_eq!(groups[0].children[1].total, dec("50"));
        assert_eq!(groups[0].total, dec("150"));
    }

    #[test]
    fn test_sub_key_never_merges_with_record_id() {
        let records = vec![
            record(5, "2025-07-02", "Ofis", "100"),
            record(7, "2025-07-03", "Ofis", "50"),
        ];
        let only_seven = |r: &TransactionRecord| (r.id == 7).then(|| "5".to_string());
        let groups = transform(&records, july(), by_budget_item, only_seven);

        let children = &groups[0].children;
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].record_ids, vec![5]);
        assert_eq!(children[1].record_ids, vec![7]);
        assert_eq!(children[1].description, "5");
        assert_group_invariants(&groups, july());
    }

    #[test]
    fn test_invariants_hold_on_mixed_input() {
        let records: Vec<_> = (0..60)
            .map(|i| {
                let day = (i % 28) + 1;
                let item = ["Ofis", "Araç", "Maaş", "Kira"][(i % 4) as usize];
                let amount = format!("{}.{:02}", i * 7 - 100, (i * 13) % 100);
                record(i, &format!("2025-07-{:02}", day), item, &amount)
            })
            .collect();

        let table = PivotTable::build(&records, july(), by_budget_item, per_record);
        assert_group_invariants(&table.groups, july());

        let group_sum: Decimal = table.groups.iter().map(|g| g.total).sum();
        let record_sum: Decimal = records.iter().map(|r| r.amount).sum();
        assert_eq!(table.grand_total, group_sum);
        assert_eq!(table.grand_total, record_sum);
    }

    #[test]
    fn test_decimal_sums_do_not_drift() {
        let records: Vec<_> = (0..10).map(|i| record(i, "2025-07-10", "Ofis", "0.1")).collect();
        let table = PivotTable::build(&records, july(), by_budget_item, per_record);
        assert_eq!(table.grand_total, dec("1.0"));
    }

    #[test]
    fn test_transform_is_idempotent() {
        let records = vec![
            record(1, "2025-07-08", "Ofis", "100"),
            record(2, "2025-07-20", "Araç", "30"),
        ];
        let first = transform(&records, july(), by_budget_item, per_record);
        let second = transform(&records, july(), by_budget_item, per_record);
        assert_eq!(first, second);
    }

    #[test]
    fn test_memo_rebuilds_only_on_change() {
        let records = vec![record(1, "2025-07-08", "Ofis", "100")];
        let mut memo = PivotMemo::new(by_budget_item, per_record);

        assert_eq!(memo.table(&records, july()).grand_total, dec("100"));
        memo.table(&records, july());
        assert_eq!(memo.builds(), 1);

        memo.table(&records, july().succ());
        assert_eq!(memo.builds(), 2);

        let more = vec![record(1, "2025-07-08", "Ofis", "100"), record(2, "2025-07-09", "Ofis", "1")];
        assert_eq!(memo.table(&more, july()).grand_total, dec("101"));
        assert_eq!(memo.builds(), 3);
    }
}
