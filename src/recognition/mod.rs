pub mod interface;
pub mod combined;
pub mod two_stage;
pub mod ocr;
pub mod factory;

pub use interface::{Recognition, RecognitionStrategy};
pub use combined::CombinedRecognizer;
pub use two_stage::TwoStageRecognizer;
pub use ocr::{OcrEngine, OcrError, OcrOutput, TesseractEngine};
pub use factory::RecognitionFactory;
