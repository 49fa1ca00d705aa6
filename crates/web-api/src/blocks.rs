//! Slack Block Kit 报表渲染

use application::ViewResult;
use domain::{EmojiUsage, ReactionRanking, ReactionTally, SlackUserId, UserRanking};
use serde_json::{json, Value};

const EPHEMERAL: &str = "ephemeral";
const IN_CHANNEL: &str = "in_channel";

/// 报表渲染器
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder {
    /// 每个报表最多展示的条目数
    pub top_n: usize,
    /// 帮助文本里提到的默认天数
    pub default_days: u32,
}

impl ReportBuilder {
    pub fn new(top_n: usize, default_days: u32) -> Self {
        Self {
            top_n,
            default_days,
        }
    }

    pub fn help(&self) -> Value {
        self.with_help("I understand the following commands:")
    }

    pub fn error(&self) -> Value {
        self.with_help("Sorry, I didn't understand that. I understand the following commands:")
    }

    pub fn render(&self, result: &ViewResult, days: u32) -> Value {
        match result {
            ViewResult::TopReactions(data) => self.top_reactions(data, days),
            ViewResult::TopUsers(data) => self.top_users(data, days),
            ViewResult::ReactionsForUser { user, reactions } => {
                self.reactions_for_user(user, reactions, days)
            }
            ViewResult::UsersForEmoji(usage) => self.users_for_emoji(usage, days),
        }
    }

    pub fn top_reactions(&self, data: &[ReactionRanking], days: u32) -> Value {
        let mut blocks = vec![plain_section(format!(
            "The top emoji reactions over {} are:",
            window_phrase(days)
        ))];
        for (i, datum) in data.iter().take(self.top_n).enumerate() {
            let name = datum.reaction.as_str();
            blocks.push(mrkdwn_section(format!("*{}*) :{name}: `:{name}:`", rank(i))));
            blocks.push(json!({
                "type": "context",
                "elements": [mrkdwn(format!(
                    "*{}* reactions, *{}* users",
                    datum.count, datum.distinct_user_count
                ))],
            }));
        }
        payload(IN_CHANNEL, blocks)
    }

    pub fn top_users(&self, data: &[UserRanking], days: u32) -> Value {
        let mut blocks = vec![plain_section(format!(
            "The top reactors over {} are:",
            window_phrase(days)
        ))];
        for (i, datum) in data.iter().take(self.top_n).enumerate() {
            blocks.push(divider());
            blocks.push(mrkdwn_section(format!(
                "*{}*)   <@{}>   *{}* reactions",
                rank(i),
                datum.user_id,
                datum.count
            )));
            let elements: Vec<Value> = datum
                .reactions
                .iter()
                .take(self.top_n)
                .map(|r| mrkdwn(format!(":{}:   {}x", r.reaction, r.count)))
                .collect();
            // context 块不允许空的 elements
            if !elements.is_empty() {
                blocks.push(json!({ "type": "context", "elements": elements }));
            }
        }
        blocks.push(divider());
        payload(IN_CHANNEL, blocks)
    }

    pub fn reactions_for_user(
        &self,
        user: &SlackUserId,
        data: &[ReactionTally],
        days: u32,
    ) -> Value {
        let heading = if data.is_empty() {
            format!(
                "No emoji reactions by <@{user}> over {} :white_frowning_face:",
                window_phrase(days)
            )
        } else {
            format!(
                "The top emoji reactions by <@{user}> over {} are:",
                window_phrase(days)
            )
        };
        let mut blocks = vec![mrkdwn_section(heading)];
        for (i, datum) in data.iter().take(self.top_n).enumerate() {
            let name = datum.reaction.as_str();
            blocks.push(mrkdwn_section(format!(
                "*{}*) :{name}: `:{name}:` _{}x_",
                rank(i),
                datum.count
            )));
        }
        payload(IN_CHANNEL, blocks)
    }

    pub fn users_for_emoji(&self, usage: &EmojiUsage, days: u32) -> Value {
        let name = usage.reaction.as_str();
        let heading = if usage.users.is_empty() {
            format!(":{name}: `:{name}:` was not used over {}.", window_phrase(days))
        } else {
            format!(
                ":{name}: `:{name}:` was used *{}* times over {}. The top users are:",
                usage.total,
                window_phrase(days)
            )
        };
        let mut blocks = vec![mrkdwn_section(heading)];
        for (i, datum) in usage.users.iter().take(self.top_n).enumerate() {
            blocks.push(mrkdwn_section(format!(
                "*{}*) <@{}> _{}x_",
                rank(i),
                datum.user_id,
                datum.count
            )));
        }
        payload(IN_CHANNEL, blocks)
    }

    fn with_help(&self, intro: &str) -> Value {
        let window = window_phrase(self.default_days);
        let lines = [
            format!("• `/emojireport emoji [days]` The top emoji reactions over {window}"),
            format!("• `/emojireport people [days]` The top reactors over {window}"),
            format!("• `/emojireport @user [days]` The top emoji reactions by @user over {window}"),
            format!("• `/emojireport :emoji: [days]` The top users of :emoji: over {window}"),
            "• `/emojireport help` Show the list of supported commands".to_string(),
        ];
        let mut blocks = vec![plain_section(intro)];
        blocks.extend(lines.into_iter().map(mrkdwn_section));
        payload(EPHEMERAL, blocks)
    }
}

/// 两位排名，如 `01`
fn rank(index: usize) -> String {
    format!("{:02}", index + 1)
}

fn window_phrase(days: u32) -> String {
    if days == 1 {
        "the last day".to_string()
    } else {
        format!("the last {days} days")
    }
}

fn payload(response_type: &str, blocks: Vec<Value>) -> Value {
    json!({ "response_type": response_type, "blocks": blocks })
}

fn plain_section(text: impl Into<String>) -> Value {
    json!({
        "type": "section",
        "text": { "type": "plain_text", "text": text.into(), "emoji": true },
    })
}

fn mrkdwn_section(text: String) -> Value {
    json!({ "type": "section", "text": mrkdwn(text) })
}

fn mrkdwn(text: String) -> Value {
    json!({ "type": "mrkdwn", "text": text })
}

fn divider() -> Value {
    json!({ "type": "divider" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ReactionName, UserTally};

    fn builder() -> ReportBuilder {
        ReportBuilder::new(10, 7)
    }

    fn name(n: &str) -> ReactionName {
        ReactionName::parse(n).unwrap()
    }

    fn user(id: &str) -> SlackUserId {
        SlackUserId::parse(id).unwrap()
    }

    fn texts(payload: &Value) -> Vec<String> {
        payload["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["text"]["text"].as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn help_and_error_are_ephemeral() {
        let help = builder().help();
        assert_eq!(help["response_type"], "ephemeral");
        assert_eq!(texts(&help)[0], "I understand the following commands:");
        assert!(texts(&help)[1].contains("over the last 7 days"));

        let error = builder().error();
        assert_eq!(error["response_type"], "ephemeral");
        assert!(texts(&error)[0].starts_with("Sorry"));
        assert_eq!(texts(&error).len(), texts(&help).len());
    }

    #[test]
    fn top_reactions_are_ranked_and_capped() {
        let data: Vec<ReactionRanking> = (0..12)
            .map(|i| ReactionRanking {
                reaction: name(&format!("r{i:02}")),
                count: 20 - i,
                distinct_user_count: 2,
            })
            .collect();
        let payload = builder().top_reactions(&data, 30);

        assert_eq!(payload["response_type"], "in_channel");
        let blocks = payload["blocks"].as_array().unwrap();
        // 标题 + 每条两个块
        assert_eq!(blocks.len(), 1 + 10 * 2);
        assert_eq!(
            blocks[0]["text"]["text"],
            "The top emoji reactions over the last 30 days are:"
        );
        assert_eq!(blocks[1]["text"]["text"], "*01*) :r00: `:r00:`");
        assert_eq!(
            blocks[2]["elements"][0]["text"],
            "*20* reactions, *2* users"
        );
        assert_eq!(blocks[19]["text"]["text"], "*10*) :r09: `:r09:`");
    }

    #[test]
    fn top_users_include_their_reactions() {
        let data = vec![UserRanking {
            user_id: user("UX"),
            count: 3,
            reactions: vec![
                ReactionTally {
                    reaction: name("fire"),
                    count: 2,
                },
                ReactionTally {
                    reaction: name("tada"),
                    count: 1,
                },
            ],
        }];
        let payload = builder().top_users(&data, 1);
        let blocks = payload["blocks"].as_array().unwrap();

        assert_eq!(
            blocks[0]["text"]["text"],
            "The top reactors over the last day are:"
        );
        assert_eq!(blocks[1]["type"], "divider");
        assert_eq!(blocks[2]["text"]["text"], "*01*)   <@UX>   *3* reactions");
        assert_eq!(blocks[3]["elements"][0]["text"], ":fire:   2x");
        assert_eq!(blocks[3]["elements"][1]["text"], ":tada:   1x");
        assert_eq!(blocks.last().unwrap()["type"], "divider");
    }

    #[test]
    fn user_report_with_and_without_data() {
        let empty = builder().reactions_for_user(&user("UX"), &[], 7);
        assert_eq!(
            texts(&empty),
            vec!["No emoji reactions by <@UX> over the last 7 days :white_frowning_face:"]
        );

        let data = vec![ReactionTally {
            reaction: name("fire"),
            count: 4,
        }];
        let payload = builder().reactions_for_user(&user("UX"), &data, 7);
        assert_eq!(texts(&payload)[1], "*01*) :fire: `:fire:` _4x_");
    }

    #[test]
    fn emoji_report_with_and_without_data() {
        let unused = EmojiUsage {
            reaction: name("fire"),
            total: 0,
            users: vec![],
        };
        assert_eq!(
            texts(&builder().users_for_emoji(&unused, 7)),
            vec![":fire: `:fire:` was not used over the last 7 days."]
        );

        let used = EmojiUsage {
            reaction: name("fire"),
            total: 5,
            users: vec![UserTally {
                user_id: user("UY"),
                count: 5,
            }],
        };
        let texts = texts(&builder().users_for_emoji(&used, 14));
        assert_eq!(
            texts[0],
            ":fire: `:fire:` was used *5* times over the last 14 days. The top users are:"
        );
        assert_eq!(texts[1], "*01*) <@UY> _5x_");
    }
}
