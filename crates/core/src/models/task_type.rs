//! 任务类型白名单
//!
//! 调用方在提交任务前用 [`validate_task`] 检查 `type/sub_type` 组合。

use crate::errors::{SchedulerError, SchedulerResult};

pub const TASK_TYPE_PDF: &str = "pdf";
pub const TASK_TYPE_CSV: &str = "csv";
pub const TASK_TYPE_IMAGE: &str = "image";

pub const SUB_TYPE_PDF2CSV: &str = "pdf2csv";
pub const SUB_TYPE_PDF2IMG: &str = "pdf2img";
pub const SUB_TYPE_PDF_SPLITTER: &str = "pdfsplitter";
pub const SUB_TYPE_PDF_MERGER: &str = "pdfmerger";
pub const SUB_TYPE_PDF_ROTATOR: &str = "pdfrotator";
pub const SUB_TYPE_PDF_WATERMARK_REMOVER: &str = "pdfwatermarkremover";
pub const SUB_TYPE_PDF_WATERMARK_ADDER: &str = "pdfwatermarkadder";

const VALID_TASK_SUB_TYPES: &[(&str, &[&str])] = &[
    (
        TASK_TYPE_PDF,
        &[
            SUB_TYPE_PDF2CSV,
            SUB_TYPE_PDF2IMG,
            SUB_TYPE_PDF_SPLITTER,
            SUB_TYPE_PDF_MERGER,
            SUB_TYPE_PDF_ROTATOR,
            SUB_TYPE_PDF_WATERMARK_REMOVER,
            SUB_TYPE_PDF_WATERMARK_ADDER,
        ],
    ),
    (TASK_TYPE_CSV, &[SUB_TYPE_PDF2CSV]),
    // image 类型暂无可用的子类型
    (TASK_TYPE_IMAGE, &[]),
];

/// 返回某个任务类型支持的子类型
pub fn sub_types_of(task_type: &str) -> Option<&'static [&'static str]> {
    VALID_TASK_SUB_TYPES
        .iter()
        .find(|(t, _)| *t == task_type)
        .map(|(_, subs)| *subs)
}

pub fn is_valid_task(task_type: &str, sub_type: &str) -> bool {
    sub_types_of(task_type)
        .map(|subs| subs.contains(&sub_type))
        .unwrap_or(false)
}

pub fn validate_task(task_type: &str, sub_type: &str) -> SchedulerResult<()> {
    if is_valid_task(task_type, sub_type) {
        Ok(())
    } else {
        Err(SchedulerError::InvalidTask {
            task_type: task_type.to_string(),
            sub_type: sub_type.to_string(),
        })
    }
}
