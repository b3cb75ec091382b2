use teloxide::types::{ChatId, MessageEntity, MessageId, Update};
use tg_menu_bot::bot::ReplyMode;
use tg_menu_bot::handlers::command_handler::STATUS_PROMPT;
use tg_menu_bot::menu::{Menu, FIRST_MENU, SECOND_MENU};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::mock_platform::Call;
use super::test_utils::{EventBuilder, TestBot, TEST_CHAT};

#[tokio::test]
async fn test_plain_text_is_copied_back() {
    let mut bot = TestBot::new();

    bot.send_text("hello there").await;

    assert_eq!(
        bot.platform.calls(),
        vec![Call::CopyMessage {
            chat_id: TEST_CHAT,
            from_chat_id: TEST_CHAT,
            message_id: MessageId(1),
        }]
    );
}

#[tokio::test]
async fn test_scream_mode_upper_cases_and_keeps_entities() {
    let mut bot = TestBot::new();
    bot.send_text("/scream").await;
    assert_eq!(bot.dispatcher.session().reply_mode, ReplyMode::Screaming);
    assert!(bot.platform.calls().is_empty());

    let entities = vec![MessageEntity::bold(0, 5), MessageEntity::italic(6, 5)];
    bot.dispatcher
        .dispatch(EventBuilder::text_with_entities("hello world", entities.clone()))
        .await;

    assert_eq!(
        bot.platform.calls(),
        vec![Call::SendText {
            chat_id: TEST_CHAT,
            text: "HELLO WORLD".to_string(),
            entities,
        }]
    );
}

#[tokio::test]
async fn test_scream_mode_keeps_spans_on_non_ascii_text() {
    let mut bot = TestBot::new();
    bot.send_text("/scream").await;

    // "ok" sits at utf-16 offset 7 and stays there after upper-casing
    let entities = vec![MessageEntity::italic(7, 2)];
    bot.dispatcher
        .dispatch(EventBuilder::text_with_entities("straße ok", entities.clone()))
        .await;

    let calls = bot.platform.calls();
    assert_eq!(
        calls,
        vec![Call::SendText {
            chat_id: TEST_CHAT,
            text: "STRAßE OK".to_string(),
            entities,
        }]
    );

    let Call::SendText { text, .. } = &calls[0] else {
        unreachable!()
    };
    let units: Vec<u16> = text.encode_utf16().collect();
    assert_eq!(String::from_utf16(&units[7..9]).unwrap(), "OK");
}

#[tokio::test]
async fn test_scream_and_whisper_toggle() {
    let mut bot = TestBot::new();

    bot.send_text("/scream").await;
    bot.send_text("/scream").await;
    assert_eq!(bot.dispatcher.session().reply_mode, ReplyMode::Screaming);

    bot.send_text("/whisper").await;
    assert_eq!(bot.dispatcher.session().reply_mode, ReplyMode::Normal);

    bot.send_text("/whisper").await;
    bot.send_text("/scream").await;
    assert_eq!(bot.dispatcher.session().reply_mode, ReplyMode::Screaming);

    bot.send_text("/whisper").await;
    bot.send_text("quiet").await;
    assert!(matches!(
        bot.platform.calls().as_slice(),
        [Call::CopyMessage { .. }]
    ));
}

#[tokio::test]
async fn test_scream_mode_copies_messages_without_text() {
    let mut bot = TestBot::new();
    bot.send_text("/scream").await;

    // e.g. a photo without caption
    bot.send_text("").await;

    assert!(matches!(
        bot.platform.calls().as_slice(),
        [Call::CopyMessage { .. }]
    ));
}

#[tokio::test]
async fn test_messages_without_sender_are_ignored() {
    let mut bot = TestBot::new();

    bot.dispatcher.dispatch(EventBuilder::anonymous("/menu")).await;
    bot.dispatcher.dispatch(EventBuilder::anonymous("hi")).await;

    assert!(bot.platform.calls().is_empty());
}

#[tokio::test]
async fn test_menu_command_sends_first_menu() {
    let mut bot = TestBot::new();

    bot.send_text("/menu").await;

    assert_eq!(
        bot.platform.calls(),
        vec![Call::SendHtml {
            chat_id: TEST_CHAT,
            html: FIRST_MENU.to_string(),
            keyboard: Menu::First.keyboard(),
        }]
    );
}

#[tokio::test]
async fn test_refund_command_behaves_like_menu() {
    let mut bot = TestBot::new();

    bot.send_text("/refund").await;
    bot.send_text("/refund some charge").await;

    let expected = Call::SendHtml {
        chat_id: TEST_CHAT,
        html: FIRST_MENU.to_string(),
        keyboard: Menu::First.keyboard(),
    };
    assert_eq!(bot.platform.calls(), vec![expected.clone(), expected]);
}

#[tokio::test]
async fn test_status_requires_payload() {
    let mut bot = TestBot::new();

    bot.send_text("/status").await;
    assert_eq!(bot.platform.texts_for_chat(TEST_CHAT), vec![STATUS_PROMPT]);

    bot.platform.clear();
    bot.send_text("/status abc123").await;
    assert!(bot.platform.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_commands_are_ignored() {
    let mut bot = TestBot::new();

    bot.send_text("/start").await;
    bot.send_text("/help me").await;

    assert!(bot.platform.calls().is_empty());
    assert_eq!(bot.dispatcher.session().reply_mode, ReplyMode::Normal);
}

#[tokio::test]
async fn test_next_button_shows_second_menu() {
    let mut bot = TestBot::new();

    bot.dispatcher.dispatch(EventBuilder::click("Next")).await;

    assert_eq!(
        bot.platform.calls(),
        vec![
            Call::AnswerCallback {
                callback_id: "cb-1".to_string(),
            },
            Call::EditHtml {
                chat_id: TEST_CHAT,
                message_id: MessageId(5),
                html: SECOND_MENU.to_string(),
                keyboard: Menu::Second.keyboard(),
            },
        ]
    );
}

#[tokio::test]
async fn test_back_button_shows_first_menu() {
    let mut bot = TestBot::new();

    bot.dispatcher.dispatch(EventBuilder::click("Back")).await;

    match bot.platform.calls().as_slice() {
        [Call::AnswerCallback { .. }, Call::EditHtml { html, keyboard, .. }] => {
            assert_eq!(html, FIRST_MENU);
            assert_eq!(keyboard, &Menu::First.keyboard());
        }
        other => panic!("unexpected calls: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_button_renders_empty_menu() {
    let mut bot = TestBot::new();

    bot.dispatcher.dispatch(EventBuilder::click("/buy")).await;

    match bot.platform.calls().as_slice() {
        [Call::AnswerCallback { .. }, Call::EditHtml { html, keyboard, .. }] => {
            assert!(html.is_empty());
            assert!(keyboard.inline_keyboard.is_empty());
        }
        other => panic!("unexpected calls: {:?}", other),
    }
    assert!(bot.platform.invoices().is_empty());
}

#[tokio::test]
async fn test_button_without_message_is_only_acknowledged() {
    let mut bot = TestBot::new();
    let event = match EventBuilder::click("Next") {
        tg_menu_bot::bot::Event::ButtonClick(mut click) => {
            click.location = None;
            tg_menu_bot::bot::Event::ButtonClick(click)
        }
        _ => unreachable!(),
    };

    bot.dispatcher.dispatch(event).await;

    assert_eq!(
        bot.platform.calls(),
        vec![Call::AnswerCallback {
            callback_id: "cb-1".to_string(),
        }]
    );
}

fn text_update(update_id: i32, text: &str) -> Update {
    let json = serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1700000000,
            "chat": {"id": 42, "type": "private", "first_name": "Ann"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
            "text": text
        }
    });
    serde_json::from_str(&json.to_string()).unwrap()
}

#[tokio::test]
async fn test_run_processes_feed_in_order_until_closed() {
    let mut bot = TestBot::new();
    let (tx, rx) = mpsc::channel(8);

    tx.send(text_update(1, "/scream")).await.unwrap();
    tx.send(text_update(2, "loud")).await.unwrap();
    tx.send(text_update(3, "/menu")).await.unwrap();
    drop(tx);

    bot.dispatcher.run(rx, CancellationToken::new()).await;

    let calls = bot.platform.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::SendText {
            chat_id: ChatId(42),
            text: "LOUD".to_string(),
            entities: Vec::new(),
        }
    );
    assert!(matches!(&calls[1], Call::SendHtml { html, .. } if html == FIRST_MENU));
    assert_eq!(bot.dispatcher.session().reply_mode, ReplyMode::Screaming);
}

#[tokio::test]
async fn test_run_stops_when_cancelled() {
    let mut bot = TestBot::new();
    let (tx, rx) = mpsc::channel(8);
    tx.send(text_update(1, "/menu")).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    // returns without draining the pending update while the sender is alive
    bot.dispatcher.run(rx, cancel).await;

    assert!(bot.platform.calls().is_empty());
    drop(tx);
}

#[tokio::test]
async fn test_run_cancelled_while_waiting() {
    let mut bot = TestBot::new();
    let (_tx, rx) = mpsc::channel::<Update>(8);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        bot.dispatcher.run(rx, cancel),
    )
    .await
    .expect("dispatcher did not stop after cancellation");
}
