// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end recognition through the public API with a deterministic engine.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use inkread_core::{BestResult, EngineError, InkreadError, Recognition, RecognizerConfig};
use inkread_ocr::{RecognitionEngine, Recognizer};

/// Answers by segmentation mode and records what it was asked.
#[derive(Default)]
struct ModeEngine {
    seen: Mutex<Vec<(u32, u32, String, String)>>,
}

#[async_trait]
impl RecognitionEngine for ModeEngine {
    fn name(&self) -> &str {
        "mode"
    }

    async fn recognize(
        &self,
        image: &GrayImage,
        languages: &str,
        config: &str,
    ) -> Result<Recognition, EngineError> {
        self.seen.lock().unwrap().push((
            image.width(),
            image.height(),
            languages.to_string(),
            config.to_string(),
        ));
        if config.contains("--psm 11") {
            Ok(Recognition::new("TOTAL 12.50", vec![-1.0, 93.0, 91.0]))
        } else if config.contains("--psm 3") {
            Err(EngineError::Failed {
                detail: "layout analysis failed".into(),
            })
        } else {
            Ok(Recognition::new("", vec![-1.0]))
        }
    }
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

/// A 500x250 receipt-like page: light paper with a few dark text bars.
fn receipt_png() -> Vec<u8> {
    let page = RgbImage::from_fn(500, 250, |x, y| {
        let in_row = (40..60).contains(&y) || (100..120).contains(&y) || (160..180).contains(&y);
        if in_row && (50..450).contains(&x) && x % 16 < 10 {
            Rgb([30, 30, 30])
        } else {
            Rgb([235, 232, 225])
        }
    });
    encode(DynamicImage::ImageRgb8(page), ImageFormat::Png)
}

/// Small target keeps most tests fast; the upscaling test uses the default.
fn recognizer(engine: &Arc<ModeEngine>, target_long_side: u32) -> Recognizer {
    let dyn_engine: Arc<dyn RecognitionEngine> = engine.clone();
    let config = RecognizerConfig {
        target_long_side,
        ..RecognizerConfig::default()
    };
    Recognizer::new(dyn_engine, &config).unwrap()
}

#[tokio::test]
async fn receipt_is_recognized_with_best_combination() {
    let engine = Arc::new(ModeEngine::default());
    let best = recognizer(&engine, 500)
        .recognize(&receipt_png(), None)
        .await
        .unwrap();

    assert_eq!(best.text, "TOTAL 12.50");
    assert_eq!(best.confidence, 92.0);
    assert_eq!(best.config_id, "11");
    // Every variant answers the same for mode 11; the stored confidence
    // carries no length bonus, so each later equal answer takes over.
    assert_eq!(best.pipeline, "binary_adapt_morph");

    // Early exit: only the first language set was searched.
    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.len(), 12);
    assert!(seen.iter().all(|(_, _, lang, _)| lang == "eng+ara"));
}

#[tokio::test]
async fn small_inputs_reach_the_engine_upscaled() {
    let engine = Arc::new(ModeEngine::default());
    recognizer(&engine, 2100)
        .recognize(&receipt_png(), None)
        .await
        .unwrap();

    let seen = engine.seen.lock().unwrap();
    assert!(seen.iter().all(|(w, h, _, _)| (*w, *h) == (2100, 1050)));
}

#[tokio::test]
async fn whitelist_is_applied_to_every_attempt() {
    let engine = Arc::new(ModeEngine::default());
    recognizer(&engine, 500)
        .recognize(&receipt_png(), Some("0123456789.TOAL"))
        .await
        .unwrap();

    let seen = engine.seen.lock().unwrap();
    assert!(
        seen.iter()
            .all(|(_, _, _, config)| config.ends_with("-c tessedit_char_whitelist=0123456789.TOAL"))
    );
}

#[tokio::test]
async fn undecodable_upload_fails_before_recognition() {
    let engine = Arc::new(ModeEngine::default());
    let err = recognizer(&engine, 500)
        .recognize(b"GIF89a-but-not-really", None)
        .await
        .unwrap_err();
    assert!(matches!(err, InkreadError::InvalidImage(_)));
    assert!(engine.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_page_returns_empty_result() {
    struct SilentEngine;

    #[async_trait]
    impl RecognitionEngine for SilentEngine {
        fn name(&self) -> &str {
            "silent"
        }

        async fn recognize(
            &self,
            _image: &GrayImage,
            _languages: &str,
            _config: &str,
        ) -> Result<Recognition, EngineError> {
            Ok(Recognition::new("", vec![-1.0, -1.0]))
        }
    }

    let blank = encode(
        DynamicImage::ImageLuma8(GrayImage::from_pixel(150, 100, Luma([255u8]))),
        ImageFormat::Png,
    );
    let config = RecognizerConfig {
        target_long_side: 300,
        ..RecognizerConfig::default()
    };
    let recognizer = Recognizer::new(Arc::new(SilentEngine), &config).unwrap();
    let best = recognizer.recognize(&blank, None).await.unwrap();

    assert_eq!(best, BestResult::default());
    let json = serde_json::to_value(&best).unwrap();
    assert_eq!(json["text"], "");
    assert_eq!(json["confidence"], 0.0);
    assert!(json.get("configId").is_some());
}

#[tokio::test]
async fn repeated_requests_are_deterministic() {
    let engine = Arc::new(ModeEngine::default());
    let recognizer = recognizer(&engine, 500);
    let first = recognizer.recognize(&receipt_png(), None).await.unwrap();
    let second = recognizer.recognize(&receipt_png(), None).await.unwrap();
    assert_eq!(first, second);
}
