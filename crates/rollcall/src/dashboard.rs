//! Aggregate counts for the dashboard view.

use serde::Serialize;

use crate::member::{Group, Member};

/// One bar in the per-group chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupBar {
    /// The group.
    pub group: Group,
    /// Members in the group.
    pub count: i64,
    /// Bar height relative to the tallest bar, 0-100.
    pub percent: f64,
}

/// Registration totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// All registered members, with or without a group.
    pub total: i64,
    /// Every group in declaration order, including empty ones.
    pub groups: Vec<GroupBar>,
    /// Largest group count, never below 1 so it can scale the chart.
    pub max_count: i64,
}

impl Dashboard {
    /// Summarize a list of members.
    #[must_use]
    pub fn from_members(members: &[Member]) -> Self {
        let counts = Group::ALL.map(|group| {
            let count = members.iter().filter(|m| m.group == Some(group)).count();
            (group, i64::try_from(count).unwrap_or(i64::MAX))
        });
        let total = i64::try_from(members.len()).unwrap_or(i64::MAX);
        Self::from_counts(total, &counts)
    }

    /// Build from a total and per-group counts as the store reports them.
    ///
    /// Groups missing from `counts` show as zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(total: i64, counts: &[(Group, i64)]) -> Self {
        let count_of = |group: Group| {
            counts
                .iter()
                .find(|(g, _)| *g == group)
                .map_or(0, |(_, count)| *count)
        };
        let max_count = Group::ALL
            .into_iter()
            .map(count_of)
            .max()
            .unwrap_or(0)
            .max(1);

        let groups = Group::ALL
            .into_iter()
            .map(|group| {
                let count = count_of(group);
                GroupBar {
                    group,
                    count,
                    percent: count as f64 / max_count as f64 * 100.0,
                }
            })
            .collect();

        Self {
            total,
            groups,
            max_count,
        }
    }

    /// Count for one group.
    #[must_use]
    pub fn count(&self, group: Group) -> i64 {
        self.groups
            .iter()
            .find(|bar| bar.group == group)
            .map_or(0, |bar| bar.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn member(group: Option<Group>) -> Member {
        Member {
            name: "x".to_string(),
            group,
            ..Member::draft(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Universal")
        }
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = Dashboard::from_members(&[]);
        assert_eq!(dashboard.total, 0);
        assert_eq!(dashboard.max_count, 1);
        assert_eq!(dashboard.groups.len(), 6);
        assert!(dashboard.groups.iter().all(|bar| bar.count == 0 && bar.percent == 0.0));
    }

    #[test]
    fn test_counts_and_percent() {
        let members = vec![
            member(Some(Group::Fju)),
            member(Some(Group::Fju)),
            member(Some(Group::Fju)),
            member(Some(Group::Fju)),
            member(Some(Group::Evg)),
            member(None),
        ];
        let dashboard = Dashboard::from_members(&members);

        assert_eq!(dashboard.total, 6);
        assert_eq!(dashboard.max_count, 4);
        assert_eq!(dashboard.count(Group::Fju), 4);
        assert_eq!(dashboard.count(Group::Ebi), 0);

        let evg = dashboard.groups[0];
        assert_eq!(evg.group, Group::Evg);
        assert!((evg.percent - 25.0).abs() < f64::EPSILON);
        assert!((dashboard.groups[2].percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_declaration_order() {
        let dashboard = Dashboard::from_counts(0, &[]);
        let order: Vec<Group> = dashboard.groups.iter().map(|bar| bar.group).collect();
        assert_eq!(order, Group::ALL.to_vec());
    }

    #[test]
    fn test_from_counts_matches_from_members() {
        let members = vec![member(Some(Group::Caleb)), member(Some(Group::Ninguno))];
        let counts = [(Group::Caleb, 1), (Group::Ninguno, 1)];
        assert_eq!(
            Dashboard::from_counts(2, &counts),
            Dashboard::from_members(&members)
        );
    }

    #[test]
    fn test_serializes_labels() {
        let json = serde_json::to_string(&Dashboard::from_counts(1, &[(Group::Ebi, 1)])).unwrap();
        assert!(json.contains("\"EBI\""));
        assert!(json.contains("\"max_count\":1"));
    }
}
