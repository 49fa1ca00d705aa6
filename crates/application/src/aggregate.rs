//! 窗口聚合
//!
//! 把窗口内各日的记录按反应名合并：`count` 逐日相加，`user_counts` 按用户相加
//! （缺失的键视为 0）。合并只依赖键，不依赖记录到达的先后，所以可以乱序并发读取。
//!
//! 所有视图按计数降序排列，计数相同时按键（反应名或用户 ID）字典序升序，
//! 并丢弃最终计数 <= 0 的条目。

use std::cmp::Ordering;
use std::collections::BTreeMap;

use domain::{
    DailyReactionRecord, EmojiUsage, ReactionName, ReactionRanking, ReactionTally, SlackUserId,
    UserRanking, UserTally,
};

/// 单个反应在窗口内的合计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionTotals {
    pub count: i64,
    pub user_counts: BTreeMap<SlackUserId, i64>,
}

impl ReactionTotals {
    fn merge(&mut self, count: i64, user_counts: BTreeMap<SlackUserId, i64>) {
        self.count += count;
        for (user, n) in user_counts {
            *self.user_counts.entry(user).or_insert(0) += n;
        }
    }

    fn distinct_users(&self) -> usize {
        self.user_counts.values().filter(|n| **n > 0).count()
    }
}

/// 窗口内按反应名合并后的计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowAggregate {
    reactions: BTreeMap<ReactionName, ReactionTotals>,
}

impl WindowAggregate {
    pub fn fold<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DailyReactionRecord>,
    {
        let mut aggregate = Self::default();
        aggregate.absorb_all(records);
        aggregate
    }

    pub fn absorb(&mut self, record: DailyReactionRecord) {
        self.reactions
            .entry(record.reaction)
            .or_default()
            .merge(record.count, record.user_counts);
    }

    pub fn absorb_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = DailyReactionRecord>,
    {
        for record in records {
            self.absorb(record);
        }
    }

    /// 合并另一个聚合（求和）
    pub fn merge(&mut self, other: WindowAggregate) {
        for (reaction, totals) in other.reactions {
            self.reactions
                .entry(reaction)
                .or_default()
                .merge(totals.count, totals.user_counts);
        }
    }

    pub fn get(&self, reaction: &ReactionName) -> Option<&ReactionTotals> {
        self.reactions.get(reaction)
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// 热门反应
    pub fn top_reactions(&self) -> Vec<ReactionRanking> {
        let mut ranked: Vec<ReactionRanking> = self
            .reactions
            .iter()
            .filter(|(_, totals)| totals.count > 0)
            .map(|(reaction, totals)| ReactionRanking {
                reaction: reaction.clone(),
                count: totals.count,
                distinct_user_count: totals.distinct_users(),
            })
            .collect();
        ranked.sort_by(|a, b| rank(a.count, &a.reaction, b.count, &b.reaction));
        ranked
    }

    /// 热门用户：按用户倒排，附带每个用户自己的热门反应
    pub fn top_users(&self) -> Vec<UserRanking> {
        let mut by_user: BTreeMap<&SlackUserId, BTreeMap<&ReactionName, i64>> = BTreeMap::new();
        for (reaction, totals) in &self.reactions {
            for (user, n) in &totals.user_counts {
                *by_user.entry(user).or_default().entry(reaction).or_insert(0) += *n;
            }
        }

        let mut ranked: Vec<UserRanking> = by_user
            .into_iter()
            .map(|(user, reactions)| {
                let count = reactions.values().sum();
                let mut reactions: Vec<ReactionTally> = reactions
                    .into_iter()
                    .filter(|(_, n)| *n > 0)
                    .map(|(reaction, n)| ReactionTally {
                        reaction: reaction.clone(),
                        count: n,
                    })
                    .collect();
                reactions.sort_by(|a, b| rank(a.count, &a.reaction, b.count, &b.reaction));
                UserRanking {
                    user_id: user.clone(),
                    count,
                    reactions,
                }
            })
            .filter(|ranking| ranking.count > 0)
            .collect();
        ranked.sort_by(|a, b| rank(a.count, &a.user_id, b.count, &b.user_id));
        ranked
    }

    /// 某个用户的热门反应，计数只取该用户的贡献
    pub fn top_reactions_for_user(&self, user: &SlackUserId) -> Vec<ReactionTally> {
        let mut ranked: Vec<ReactionTally> = self
            .reactions
            .iter()
            .map(|(reaction, totals)| ReactionTally {
                reaction: reaction.clone(),
                count: totals.user_counts.get(user).copied().unwrap_or(0),
            })
            .filter(|tally| tally.count > 0)
            .collect();
        ranked.sort_by(|a, b| rank(a.count, &a.reaction, b.count, &b.reaction));
        ranked
    }

    /// 某个反应的热门用户及其窗口总数
    pub fn users_for_emoji(&self, emoji: &ReactionName) -> EmojiUsage {
        let Some(totals) = self.reactions.get(emoji) else {
            return EmojiUsage {
                reaction: emoji.clone(),
                total: 0,
                users: Vec::new(),
            };
        };

        let mut users: Vec<UserTally> = totals
            .user_counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(user, n)| UserTally {
                user_id: user.clone(),
                count: *n,
            })
            .collect();
        users.sort_by(|a, b| rank(a.count, &a.user_id, b.count, &b.user_id));

        EmojiUsage {
            reaction: emoji.clone(),
            total: totals.count,
            users,
        }
    }
}

/// 计数降序，计数相同按键升序
fn rank<K: Ord>(a_count: i64, a_key: &K, b_count: i64, b_key: &K) -> Ordering {
    b_count.cmp(&a_count).then_with(|| a_key.cmp(b_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DayBucket;

    fn record(day: &str, reaction: &str, users: &[(&str, i64)]) -> DailyReactionRecord {
        let user_counts: BTreeMap<SlackUserId, i64> = users
            .iter()
            .map(|(u, n)| (SlackUserId::parse(*u).unwrap(), *n))
            .collect();
        DailyReactionRecord {
            day: day.parse::<DayBucket>().unwrap(),
            reaction: ReactionName::parse(reaction).unwrap(),
            count: user_counts.values().sum(),
            user_counts,
            updated_at: None,
        }
    }

    fn name(s: &str) -> ReactionName {
        ReactionName::parse(s).unwrap()
    }

    fn user(s: &str) -> SlackUserId {
        SlackUserId::parse(s).unwrap()
    }

    #[test]
    fn counts_add_across_days() {
        let aggregate = WindowAggregate::fold(vec![
            record("2024-05-01", "fire", &[("U1", 3)]),
            record("2024-05-02", "fire", &[("U1", 2), ("U2", 3)]),
        ]);

        let top = aggregate.top_reactions();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].count, 8);
        assert_eq!(top[0].distinct_user_count, 2);
        assert_eq!(aggregate.get(&name("fire")).unwrap().user_counts[&user("U1")], 5);
    }

    #[test]
    fn fold_is_independent_of_record_order() {
        let records = vec![
            record("2024-05-01", "fire", &[("U1", 3)]),
            record("2024-05-01", "tada", &[("U2", 1)]),
            record("2024-05-02", "fire", &[("U2", 4)]),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        assert_eq!(WindowAggregate::fold(records), WindowAggregate::fold(reversed));
    }

    #[test]
    fn merge_sums_partial_aggregates() {
        let mut left = WindowAggregate::fold(vec![record("2024-05-01", "fire", &[("U1", 1)])]);
        let right = WindowAggregate::fold(vec![
            record("2024-05-02", "fire", &[("U1", 2)]),
            record("2024-05-02", "eyes", &[("U3", 1)]),
        ]);
        left.merge(right);

        let top = left.top_reactions();
        assert_eq!(top[0].reaction, name("fire"));
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].reaction, name("eyes"));
    }

    #[test]
    fn ties_break_by_name_ascending() {
        let aggregate = WindowAggregate::fold(vec![
            record("2024-05-01", "b", &[("U1", 5)]),
            record("2024-05-01", "c", &[("U1", 3)]),
            record("2024-05-01", "a", &[("U2", 5)]),
        ]);

        let order: Vec<String> = aggregate
            .top_reactions()
            .into_iter()
            .map(|r| r.reaction.to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn non_positive_entries_are_dropped() {
        let mut drifted = record("2024-05-01", "tada", &[("UX", 0), ("UY", 1)]);
        drifted.count = 1;
        let mut negative = record("2024-05-01", "skull", &[]);
        negative.count = -1;

        let aggregate = WindowAggregate::fold(vec![drifted, negative]);
        let top = aggregate.top_reactions();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].reaction, name("tada"));
        assert_eq!(top[0].count, 1);
        // 计数为 0 的用户不计入去重用户数
        assert_eq!(top[0].distinct_user_count, 1);

        let users = aggregate.top_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, user("UY"));
    }

    #[test]
    fn top_users_inverts_and_ranks_nested_reactions() {
        let aggregate = WindowAggregate::fold(vec![
            record("2024-05-01", "fire", &[("U1", 2), ("U2", 1)]),
            record("2024-05-01", "tada", &[("U1", 2)]),
            record("2024-05-02", "eyes", &[("U1", 1), ("U2", 4)]),
        ]);

        let users = aggregate.top_users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, user("U1"));
        assert_eq!(users[0].count, 5);
        assert_eq!(users[1].user_id, user("U2"));
        assert_eq!(users[1].count, 5);

        let u1: Vec<(String, i64)> = users[0]
            .reactions
            .iter()
            .map(|r| (r.reaction.to_string(), r.count))
            .collect();
        assert_eq!(
            u1,
            vec![("fire".into(), 2), ("tada".into(), 2), ("eyes".into(), 1)]
        );
    }

    #[test]
    fn reactions_for_user_use_only_that_users_share() {
        let aggregate = WindowAggregate::fold(vec![
            record("2024-05-01", "fire", &[("U1", 1), ("U2", 9)]),
            record("2024-05-02", "fire", &[("U1", 2)]),
            record("2024-05-02", "tada", &[("U2", 4)]),
        ]);

        let mine = aggregate.top_reactions_for_user(&user("U1"));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].reaction, name("fire"));
        assert_eq!(mine[0].count, 3);

        assert!(aggregate.top_reactions_for_user(&user("U404")).is_empty());
    }

    #[test]
    fn users_for_emoji_reports_total() {
        let aggregate = WindowAggregate::fold(vec![
            record("2024-05-01", "fire", &[("U1", 1), ("U2", 2)]),
            record("2024-05-02", "fire", &[("U1", 3)]),
        ]);

        let usage = aggregate.users_for_emoji(&name("fire"));
        assert_eq!(usage.total, 6);
        assert_eq!(usage.users[0].user_id, user("U1"));
        assert_eq!(usage.users[0].count, 4);
        assert_eq!(usage.users[1].count, 2);
    }

    #[test]
    fn unused_emoji_has_zero_total() {
        let usage = WindowAggregate::default().users_for_emoji(&name("ghost"));
        assert_eq!(usage.total, 0);
        assert!(usage.users.is_empty());
    }
}
