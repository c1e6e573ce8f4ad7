//! Streaming API: yield each file's result as soon as it is ready.
//!
//! A UI can poll the stream and show results one by one instead of waiting
//! for [`crate::process::DocumentProcessor::process_batch`] to return. Files
//! are still handled strictly one at a time and in upload order: the next
//! file is not started until the consumer polls for it.

use crate::output::{FileResult, UploadedFile};
use crate::process::DocumentProcessor;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;

/// A boxed stream of per-file results in upload order.
pub type FileStream = Pin<Box<dyn Stream<Item = FileResult> + Send>>;

/// Stream the results of processing `files` sequentially.
pub fn process_stream(processor: DocumentProcessor, files: Vec<UploadedFile>) -> FileStream {
    stream::iter(files)
        .then(move |file| {
            let processor = processor.clone();
            async move { processor.process_upload(&file).await }
        })
        .boxed()
}

impl DocumentProcessor {
    /// Method form of [`process_stream`].
    pub fn process_stream(&self, files: Vec<UploadedFile>) -> FileStream {
        process_stream(self.clone(), files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;
    use crate::error::FileError;

    #[tokio::test]
    async fn yields_one_result_per_file_in_order() {
        let processor = DocumentProcessor::new(ProcessorConfig::default()).unwrap();
        let files = vec![
            UploadedFile::new("a.png", vec![1], "image/png"),
            UploadedFile::new("b.txt", vec![2], "text/plain"),
            UploadedFile::new("c.jpg", vec![3], "image/jpeg"),
        ];

        let results: Vec<FileResult> = processor.process_stream(files).collect().await;

        let names: Vec<&str> = results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.txt", "c.jpg"]);
        assert_eq!(results[0].error, Some(FileError::MissingApiKey));
        assert!(matches!(results[1].error, Some(FileError::Conversion { .. })));
        assert_eq!(results[2].error, Some(FileError::MissingApiKey));
    }
}
