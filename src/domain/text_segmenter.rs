//! 文本分词器
//!
//! 将故事文本切分为可高亮的单词片段（WordSpan），偏移量以 Unicode 标量值计数，
//! 可直接作为对齐数组（AlignmentData）的下标。
//!
//! 两种实现共享同一能力接口 [`WordSegmenter`]：
//! - [`UnicodeWordSegmenter`]: 基于 UAX #29 单词边界
//! - [`RegexWordSegmenter`]: 字母/数字串正则分词（降级方案）
//!
//! 启动时通过 [`probe_segmenter`] 探测并选定其一，运行期不再判断。

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// 单词片段
///
/// 不变量:
/// - `[start_char_offset, end_char_offset)` 半开区间且非空
/// - 同一序列内的片段互不重叠、单调递增
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub text: String,
    pub start_char_offset: usize,
    pub end_char_offset: usize,
}

/// 分词器选择模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmenterMode {
    /// 探测 Unicode 分词能力，失败时降级为正则
    #[default]
    Auto,
    Unicode,
    Regex,
}

/// 分词能力接口
pub trait WordSegmenter: Send + Sync {
    /// 将文本切分为单词片段
    ///
    /// 只有"类单词"（包含字母或数字）的 token 会成为片段，
    /// 空白与标点作为不可高亮的填充保留在原文中。
    /// 同一 text + locale 的结果总是相同。
    fn segment(&self, text: &str, locale: &str) -> Vec<WordSpan>;

    /// 实现名称（用于日志）
    fn name(&self) -> &'static str;
}

#[inline]
fn is_word_like(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

/// UAX #29 单词边界分词器
///
/// 边界规则与 locale 无关，locale 仅用于日志追踪。
#[derive(Debug, Clone, Default)]
pub struct UnicodeWordSegmenter;

impl UnicodeWordSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl WordSegmenter for UnicodeWordSegmenter {
    fn segment(&self, text: &str, locale: &str) -> Vec<WordSpan> {
        let mut spans = Vec::new();
        let mut char_cursor = 0usize;

        for token in text.split_word_bounds() {
            let len = token.chars().count();
            if is_word_like(token) {
                spans.push(WordSpan {
                    text: token.to_string(),
                    start_char_offset: char_cursor,
                    end_char_offset: char_cursor + len,
                });
            }
            char_cursor += len;
        }

        tracing::trace!(locale = %locale, words = spans.len(), "Unicode segmentation done");
        spans
    }

    fn name(&self) -> &'static str {
        "unicode"
    }
}

/// 字母/数字串正则
///
/// 允许单词内部的撇号（don't, it’s）
const WORD_PATTERN: &str = r"[\p{L}\p{N}\p{M}]+(?:['’][\p{L}\p{N}\p{M}]+)*";

/// 正则分词器（降级方案）
#[derive(Debug, Clone)]
pub struct RegexWordSegmenter {
    pattern: Regex,
}

impl RegexWordSegmenter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(WORD_PATTERN)?,
        })
    }
}

impl WordSegmenter for RegexWordSegmenter {
    fn segment(&self, text: &str, locale: &str) -> Vec<WordSpan> {
        let mut spans = Vec::new();
        let mut byte_cursor = 0usize;
        let mut char_cursor = 0usize;

        for m in self.pattern.find_iter(text) {
            char_cursor += text[byte_cursor..m.start()].chars().count();
            let len = m.as_str().chars().count();
            spans.push(WordSpan {
                text: m.as_str().to_string(),
                start_char_offset: char_cursor,
                end_char_offset: char_cursor + len,
            });
            char_cursor += len;
            byte_cursor = m.end();
        }

        tracing::trace!(locale = %locale, words = spans.len(), "Regex segmentation done");
        spans
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// 探测样本及其期望的切分结果
const PROBE_SAMPLE: &str = "Hello, world 42.";
const PROBE_EXPECTED: &[(usize, usize)] = &[(0, 5), (7, 12), (13, 15)];

fn probe_passes(segmenter: &dyn WordSegmenter, locale: &str) -> bool {
    let spans = segmenter.segment(PROBE_SAMPLE, locale);
    spans.len() == PROBE_EXPECTED.len()
        && spans
            .iter()
            .zip(PROBE_EXPECTED)
            .all(|(s, &(start, end))| s.start_char_offset == start && s.end_char_offset == end)
}

/// 分词器探测错误
#[derive(Debug, thiserror::Error)]
#[error("No usable word segmenter: {0}")]
pub struct SegmenterUnavailable(String);

/// 启动时选择分词器
///
/// - `Unicode` / `Regex`: 强制使用对应实现
/// - `Auto`: Unicode 分词通过探测则使用之，否则降级为正则
pub fn probe_segmenter(
    mode: SegmenterMode,
    locale: &str,
) -> Result<Box<dyn WordSegmenter>, SegmenterUnavailable> {
    let regex = || {
        RegexWordSegmenter::new()
            .map(|s| Box::new(s) as Box<dyn WordSegmenter>)
            .map_err(|e| SegmenterUnavailable(e.to_string()))
    };

    let segmenter: Box<dyn WordSegmenter> = match mode {
        SegmenterMode::Unicode => Box::new(UnicodeWordSegmenter::new()),
        SegmenterMode::Regex => regex()?,
        SegmenterMode::Auto => {
            let unicode = UnicodeWordSegmenter::new();
            if probe_passes(&unicode, locale) {
                Box::new(unicode)
            } else {
                tracing::warn!(locale = %locale, "Unicode segmentation probe failed, falling back to regex");
                regex()?
            }
        }
    };

    tracing::info!(segmenter = segmenter.name(), locale = %locale, "Word segmenter selected");
    Ok(segmenter)
}
