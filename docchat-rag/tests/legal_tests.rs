//! Tests for the legal information assistant.

mod common;

use std::sync::Arc;

use common::{EchoGenerator, HashEmbedder, RecordingGenerator};
use docchat_rag::{
    ChatMessage, DocChat, LEGAL_DISCLAIMER, LEGAL_SYSTEM_PROMPT, LegalAssistant, RagConfig,
    RagError, Role,
};

#[tokio::test]
async fn single_question_is_sent_after_the_system_prompt() {
    let generator = Arc::new(RecordingGenerator::new("Deposits are usually refundable."));
    let legal = LegalAssistant::new(generator.clone(), "llama3.2");

    let reply = legal.ask("Can my landlord keep my deposit?").await.unwrap();
    assert_eq!(reply.response, "Deposits are usually refundable.");
    assert_eq!(reply.disclaimer, LEGAL_DISCLAIMER);

    let conversations = generator.conversations();
    assert_eq!(conversations.len(), 1);
    let (model, messages) = &conversations[0];
    assert_eq!(model, "llama3.2");
    assert_eq!(
        messages,
        &vec![
            ChatMessage::system(LEGAL_SYSTEM_PROMPT),
            ChatMessage::user("Can my landlord keep my deposit?"),
        ]
    );
}

#[tokio::test]
async fn history_is_kept_in_order_behind_the_system_prompt() {
    let generator = Arc::new(RecordingGenerator::new("A sublease transfers part of a lease."));
    let legal = LegalAssistant::new(generator.clone(), "mistral");

    let history = vec![
        ChatMessage::user("What is a lease?"),
        ChatMessage::assistant("A contract for use of property."),
        ChatMessage::user("And a sublease?"),
    ];
    legal.ask_with_history(&history).await.unwrap();

    let (_, messages) = &generator.conversations()[0];
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    assert_eq!(&messages[1..], history.as_slice());
}

#[tokio::test]
async fn blank_message_and_empty_history_are_rejected_without_a_call() {
    let generator = Arc::new(RecordingGenerator::new("unused"));
    let legal = LegalAssistant::new(generator.clone(), "llama3.2");

    assert!(matches!(legal.ask("   ").await, Err(RagError::InvalidConfig(_))));
    assert!(matches!(legal.ask_with_history(&[]).await, Err(RagError::InvalidConfig(_))));
    assert!(generator.conversations().is_empty());
}

#[tokio::test]
async fn custom_system_prompt_replaces_the_default() {
    let generator = Arc::new(RecordingGenerator::new("ok"));
    let legal =
        LegalAssistant::new(generator.clone(), "llama3.2").with_system_prompt("Answer in French.");

    legal.ask("Bonjour?").await.unwrap();
    let (_, messages) = &generator.conversations()[0];
    assert_eq!(messages[0], ChatMessage::system("Answer in French."));
}

#[tokio::test]
async fn providers_without_native_chat_receive_a_transcript() {
    let legal = LegalAssistant::new(Arc::new(EchoGenerator), "llama3.2")
        .with_system_prompt("Be careful.");

    let reply = legal
        .ask_with_history(&[ChatMessage::user("Hi"), ChatMessage::assistant("Hello"), ChatMessage::user("Help")])
        .await
        .unwrap();
    assert_eq!(reply.response, "system: Be careful.\n\nuser: Hi\n\nassistant: Hello\n\nuser: Help");
}

#[tokio::test]
async fn doc_chat_hands_out_an_assistant_on_its_default_model() {
    let generator = Arc::new(RecordingGenerator::new("ok"));
    let chat = DocChat::builder()
        .config(RagConfig::builder().generation_model("mistral").build().unwrap())
        .embedding_provider(Arc::new(HashEmbedder::new(8)))
        .generation_provider(generator.clone())
        .build()
        .unwrap();

    let legal = chat.legal_assistant();
    assert_eq!(legal.model(), "mistral");
    legal.ask("Is a verbal contract binding?").await.unwrap();
    assert_eq!(generator.conversations()[0].0, "mistral");
}
