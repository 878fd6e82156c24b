use crate::enums::telegram::Command;
use reqwest::Client;
use teloxide::prelude::ResponseResult;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use teloxide::{prelude::Requester, repls::CommandReplExt, types::Message, Bot};
use tracing::{info, warn};
use crate::error::{DeskError, Result};
use crate::money::AmountMatcher;
use crate::report::{describe_mentions, describe_status};
use crate::services::reservation_service::ReservationService;

#[derive(Clone)]
pub struct TelegramService {
    bot: Bot,
    chat_id: Option<ChatId>,
    reservation_service: ReservationService,
    matcher: AmountMatcher,
}

impl TelegramService {
    pub fn new(
        bot_token: &str,
        chat_id: Option<i64>,
        reservation_service: ReservationService,
        matcher: AmountMatcher,
    ) -> Self {
        let reqwest_client = Client::new();
        let bot = Bot::with_client(bot_token, reqwest_client);
        Self {
            bot,
            chat_id: chat_id.map(ChatId),
            reservation_service,
            matcher,
        }
    }

    /// Sends to the configured operator chat; without one the text is only logged.
    pub async fn notify(&self, text: &str) -> Result<()> {
        let Some(chat_id) = self.chat_id else {
            info!("No TELEGRAM_CHAT_ID configured, not forwarding: {}", text);
            return Ok(());
        };
        self.bot
            .send_message(chat_id, text.to_string())
            .await
            .map_err(|e| DeskError::Telegram(e.to_string()))?;
        Ok(())
    }

    pub async fn listen_and_reply(self) {
        Command::repl(self.bot.clone(), move |bot, msg, cmd| {
            TelegramService::answer(self.clone(), bot, msg, cmd)
        })
            .await;
    }

    pub async fn answer(
        self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> ResponseResult<()> {
        info!("Received {:?} from chat {}", msg.text(), msg.chat.id.0);
        if !is_allowed(self.chat_id, msg.chat.id, &cmd) {
            warn!("Refusing {:?} from chat {}", msg.text(), msg.chat.id.0);
            bot.send_message(msg.chat.id, "This chat is not allowed to query the desk.")
                .await?;
            return Ok(());
        }
        let reply = match cmd {
            Command::Start => format!(
                "FT desk bot ready. This chat id is {}; set TELEGRAM_CHAT_ID to receive alerts.",
                msg.chat.id.0
            ),
            Command::Help => Command::descriptions().to_string(),
            Command::Status => match self.reservation_service.status().await {
                Ok(status) => describe_status(self.reservation_service.account_number(), &status),
                Err(e) => {
                    warn!("Status lookup failed: {}", e);
                    format!("Could not reach the FT API: {}", e)
                }
            },
            Command::Receiving => match self.reservation_service.scan_receiving(&self.matcher).await {
                Ok(mentions) => describe_mentions(&mentions),
                Err(e) => {
                    warn!("Receiving lookup failed: {}", e);
                    format!("Could not reach the FT API: {}", e)
                }
            },
        };
        bot.send_message(msg.chat.id, reply).await?;
        Ok(())
    }
}

/// Start and Help answer anyone. Account lookups only answer the operator
/// chat once one is configured.
pub fn is_allowed(operator_chat: Option<ChatId>, from: ChatId, cmd: &Command) -> bool {
    match cmd {
        Command::Start | Command::Help => true,
        Command::Status | Command::Receiving => operator_chat.map_or(true, |chat| chat == from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_limited_to_operator_chat() {
        let operator = Some(ChatId(42));
        assert!(is_allowed(operator, ChatId(42), &Command::Status));
        assert!(is_allowed(operator, ChatId(42), &Command::Receiving));
        assert!(!is_allowed(operator, ChatId(7), &Command::Status));
        assert!(!is_allowed(operator, ChatId(7), &Command::Receiving));
    }

    #[test]
    fn start_and_help_are_open() {
        let operator = Some(ChatId(42));
        assert!(is_allowed(operator, ChatId(7), &Command::Start));
        assert!(is_allowed(operator, ChatId(7), &Command::Help));
    }

    #[test]
    fn no_operator_chat_means_no_gate() {
        assert!(is_allowed(None, ChatId(7), &Command::Status));
    }
}
