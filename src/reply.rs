//! Outgoing replies and the phrasebook they are built from

use crate::intent::Command;
use serde::{Deserialize, Serialize};

/// Which reply keyboard the transport should attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardKind {
    /// Command menu
    Main,
    /// Yes / No buttons
    YesNo,
    /// Remove any keyboard
    None,
}

impl KeyboardKind {
    /// Button rows for transports that render keyboards; empty for `None`
    pub fn buttons(self) -> Vec<Vec<String>> {
        match self {
            KeyboardKind::Main => vec![
                vec![Command::Puzzle.to_string(), Command::Help.to_string()],
                vec![Command::Stats.to_string(), Command::Tip.to_string()],
            ],
            KeyboardKind::YesNo => vec![vec!["Да".to_string(), "Нет".to_string()]],
            KeyboardKind::None => Vec::new(),
        }
    }
}

/// A reply ready to hand to the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingResponse {
    pub text: String,
    pub keyboard: KeyboardKind,
}

impl OutgoingResponse {
    pub fn new(text: impl Into<String>, keyboard: KeyboardKind) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    pub fn main(text: impl Into<String>) -> Self {
        Self::new(text, KeyboardKind::Main)
    }

    pub fn yes_no(text: impl Into<String>) -> Self {
        Self::new(text, KeyboardKind::YesNo)
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, KeyboardKind::None)
    }
}

/// All user-facing texts.
///
/// Templates use `{correct}`, `{shown}`, `{total}`, `{answer}`, `{prompt}`
/// and `{tip}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrasebook {
    pub greeting: String,
    pub help: String,
    pub stats: String,
    pub tip: String,
    pub tips: Vec<String>,
    pub puzzle: String,
    pub correct: Vec<String>,
    pub incorrect: Vec<String>,
    pub skipped: String,
    pub back_to_menu: String,
    pub continue_reprompt: String,
    pub restart_reprompt: String,
    pub congratulations: String,
    pub fallback: String,
}

impl Default for Phrasebook {
    fn default() -> Self {
        let lines = |list: &[&str]| list.iter().map(ToString::to_string).collect();
        Self {
            greeting: "Привет! Я Code Puzzle Bot. Жми /puzzle, чтобы начать.".to_string(),
            help: "Команды:\n\
                   /puzzle — новая задачка\n\
                   /skip   — пропустить текущую\n\
                   /stats  — твоя статистика\n\
                   /tip    — совет программисту\n"
                .to_string(),
            stats: "Ты решил {correct} из {shown} показанных задач. Всего доступно: {total}."
                .to_string(),
            tip: "💡 Совет: {tip}".to_string(),
            tips: lines(&[
                "Используй Git tags для версий вместо хардкода дат.",
                "Итераторы — мощный инструмент для работы с коллекциями, учи их на продвинутом уровне.",
                "Обрабатывай ошибки явно, а не надейся, что их не будет.",
                "Не блокируй асинхронный код синхронным ожиданием, чтобы избежать дедлоков.",
                "Названия переменных должны быть говорящими — это экономит время на читабельность.",
            ]),
            puzzle: "Задача:\n{prompt}".to_string(),
            correct: lines(&[
                "Отлично, это правильный ответ! Напиши Да, чтобы получить следующую задачку, или Нет, чтобы вернуться в меню.",
                "Верно! Хочешь ещё? Жми Да или Нет.",
                "Ты молодец! Продолжим? Ответь Да или Нет.",
            ]),
            incorrect: lines(&[
                "Упс, это не так. Попробуй ещё раз или напиши /skip, чтобы пропустить вопрос.",
                "Неправильно. Можешь попробовать снова или ввести /skip.",
                "Неа. Хочешь пропустить — просто напиши /skip.",
            ]),
            skipped: "Вопрос пропущен. Правильный ответ: {answer}".to_string(),
            back_to_menu: "Окей, возвращаюсь в меню.".to_string(),
            continue_reprompt: "Не понял. Нажми Да или Нет.".to_string(),
            restart_reprompt: "Не понял. Выбери Да или Нет.".to_string(),
            congratulations: "🎉 Поздравляю! Ты прошёл все задачи! 🎉\n\
                              Правильных ответов: {correct} из {total}.\n\
                              Хочешь начать заново?"
                .to_string(),
            fallback: "Не понял. Напиши /help или /puzzle.".to_string(),
        }
    }
}

/// Substitute `{name}` placeholders
pub fn render<S: AsRef<str>>(template: &str, vars: &[(&str, S)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value.as_ref())
    })
}
