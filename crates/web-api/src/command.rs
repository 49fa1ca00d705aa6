//! 斜杠命令解析
//!
//! 文本形如 `<keyword|@user|:emoji:> [days]`，days 为 1 到 3 位数字。

use config::ReportConfig;
use domain::{ReactionName, SlackUserId};

use application::AggregationView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    AllEmoji,
    AllUsers,
    ForUser(SlackUserId),
    ForEmoji(ReactionName),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    pub command: Command,
    pub days: u32,
}

impl SlashCommand {
    fn unknown(days: u32) -> Self {
        Self {
            command: Command::Unknown,
            days,
        }
    }
}

impl Command {
    /// 对应的聚合视图；帮助和无法识别的命令没有视图
    pub fn view(&self) -> Option<AggregationView> {
        match self {
            Command::AllEmoji => Some(AggregationView::TopReactions),
            Command::AllUsers => Some(AggregationView::TopUsers),
            Command::ForUser(user) => Some(AggregationView::ReactionsForUser(user.clone())),
            Command::ForEmoji(emoji) => Some(AggregationView::UsersForEmoji(emoji.clone())),
            Command::Help | Command::Unknown => None,
        }
    }
}

fn all_emoji() -> Command {
    Command::AllEmoji
}

fn all_users() -> Command {
    Command::AllUsers
}

/// 关键字命令表
const KEYWORDS: &[(&str, fn() -> Command)] = &[
    ("emoji", all_emoji),
    ("emojis", all_emoji),
    ("people", all_users),
    ("users", all_users),
];

pub fn parse_command(text: &str, report: &ReportConfig) -> SlashCommand {
    let text = text.trim();
    if text.is_empty() || text == "help" {
        return SlashCommand {
            command: Command::Help,
            days: report.default_days,
        };
    }

    let (head, rest) = split_head(text);
    let days = match parse_days(rest, report) {
        Some(days) => days,
        None => return SlashCommand::unknown(report.default_days),
    };

    let command = KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == head)
        .map(|(_, build)| build())
        .or_else(|| parse_mention(head).map(Command::ForUser))
        .or_else(|| parse_emoji(head).map(Command::ForEmoji))
        .unwrap_or(Command::Unknown);

    SlashCommand { command, days }
}

/// 切出第一个词；`<@...>` 提及整体作为一个词（显示名里可能有空格）
fn split_head(text: &str) -> (&str, &str) {
    if text.starts_with("<@") {
        if let Some(end) = text.find('>') {
            return (&text[..=end], &text[end + 1..]);
        }
    }
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], &text[idx..]),
        None => (text, ""),
    }
}

fn parse_days(rest: &str, report: &ReportConfig) -> Option<u32> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Some(report.default_days);
    }
    if rest.len() > 3 || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let days: u32 = rest.parse().ok()?;
    (1..=report.max_days).contains(&days).then_some(days)
}

/// `<@U123>` 或 `<@U123|name>`
fn parse_mention(token: &str) -> Option<SlackUserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let id = inner.split('|').next()?;
    if id.chars().any(char::is_whitespace) {
        return None;
    }
    SlackUserId::parse(id).ok()
}

/// `:name:`
fn parse_emoji(token: &str) -> Option<ReactionName> {
    let name = token.strip_prefix(':')?.strip_suffix(':')?;
    ReactionName::parse(name).ok()
}
