//! Prompts for the screening steps
//!
//! Each builder returns the message list together with the options that
//! step runs with.

use super::options::ChatOptions;
use super::types::ChatMessage;
use crate::models::ItemType;

/// Similar images sent alongside the customer's image for analysis
pub const MAX_ANALYSIS_REFERENCE_IMAGES: usize = 5;

pub const CLASSIFY_SYSTEM: &str = "You are an expert art and antiques classifier. \
Your task is to determine if an item is Art or Antique.\n\
IMPORTANT: You must ONLY respond with either \"Art\" or \"Antique\".\n\n\
Classification guidelines:\n\
- Art: Paintings, sculptures, prints, photographs, digital art, and other artistic creations\n\
- Antique: Vintage furniture, collectibles, decorative items, historical artifacts, and items over 50 years old\n\n\
DO NOT provide any explanation or additional text. ONLY respond with \"Art\" or \"Antique\".";

pub const CLASSIFY_USER: &str =
    "Classify this item as either Art or Antique. Only respond with one word: \"Art\" or \"Antique\".";

pub const ANALYSIS_SYSTEM: &str = "You are a senior appraiser of fine art and antiques writing a \
preliminary screening for a customer. Be factual and specific. Describe what the item appears \
to be, its likely style, period and origin, materials and technique, visible condition, and any \
marks or signatures. Use the reference images only as comparables; say so when they differ from \
the customer's item. Do not state a monetary value.";

pub const ENHANCE_SYSTEM: &str = "You are an editor for a professional appraisal service. Rewrite \
the screening analysis you are given so it reads as a clear, well-organized expert opinion: \
keep every factual observation, remove repetition and hedging, and add short section headings. \
Do not invent facts and do not state a monetary value.";

pub const OFFER_SYSTEM: &str = "You write short, friendly copy for an appraisal service. Based on the \
screening analysis you are given, write two or three sentences inviting the customer to order a \
full professional appraisal, mentioning what makes their item worth a closer look. No prices, \
no guarantees, no markdown.";

/// Messages for the one-word Art/Antique classification
pub fn classification(image_url: &str) -> (Vec<ChatMessage>, ChatOptions) {
    let messages = vec![
        ChatMessage::system(CLASSIFY_SYSTEM),
        ChatMessage::user_with_images(CLASSIFY_USER, [image_url]),
    ];
    (messages, ChatOptions::new(5).with_temperature(0.1))
}

/// Messages for the screening analysis of the customer's image
pub fn analysis(
    customer_image_url: &str,
    similar_image_urls: &[String],
    item_type: ItemType,
) -> (Vec<ChatMessage>, ChatOptions) {
    let references: Vec<&str> = similar_image_urls
        .iter()
        .take(MAX_ANALYSIS_REFERENCE_IMAGES)
        .map(String::as_str)
        .collect();

    let instruction = if references.is_empty() {
        format!(
            "The first image is the customer's item, classified as {}. Write the screening analysis.",
            item_type
        )
    } else {
        format!(
            "The first image is the customer's item, classified as {}. The following {} image(s) \
             are visually similar items found on the web. Write the screening analysis.",
            item_type,
            references.len()
        )
    };

    let images = std::iter::once(customer_image_url).chain(references);
    let messages = vec![
        ChatMessage::system(ANALYSIS_SYSTEM),
        ChatMessage::user_with_images(instruction, images),
    ];
    (messages, ChatOptions::new(1000).with_temperature(0.4))
}

/// Messages for rewriting an analysis into its enhanced form
pub fn enhancement(analysis_text: &str) -> (Vec<ChatMessage>, ChatOptions) {
    let messages = vec![
        ChatMessage::system(ENHANCE_SYSTEM),
        ChatMessage::user(analysis_text),
    ];
    (messages, ChatOptions::new(1200).with_temperature(0.3))
}

/// Messages for the short call-to-action shown next to the analysis
pub fn offer(analysis_text: &str) -> (Vec<ChatMessage>, ChatOptions) {
    let messages = vec![
        ChatMessage::system(OFFER_SYSTEM),
        ChatMessage::user(analysis_text),
    ];
    (messages, ChatOptions::new(200).with_temperature(0.7))
}
