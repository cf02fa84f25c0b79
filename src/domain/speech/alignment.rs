//! Speech Context - 对齐映射
//!
//! 将单词片段的字符区间映射为播放时间区间，并在播放时按时间查找需要高亮的单词。

use serde::{Deserialize, Serialize};

use crate::domain::text_segmenter::WordSpan;

/// 字符级对齐数据（由语音合成 API 返回）
///
/// 三个数组按下标一一对应，每个元素对应合成文本中的一个字符。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentData {
    pub characters: Vec<String>,
    pub start_times: Vec<f64>,
    pub end_times: Vec<f64>,
}

impl AlignmentData {
    /// 三个数组长度一致时返回该长度
    pub fn consistent_len(&self) -> Option<usize> {
        let len = self.characters.len();
        (self.start_times.len() == len && self.end_times.len() == len).then_some(len)
    }

    /// 最后一个字符的结束时间
    pub fn last_end_time(&self) -> Option<f64> {
        self.end_times.last().copied().filter(|t| t.is_finite())
    }
}

/// 单词时间区间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub span: WordSpan,
    pub start_time: f64,
    pub end_time: f64,
}

/// 构建单词时间表
///
/// 以下任一情况返回 `None`（不高亮，但音频照常播放）:
/// - 没有对齐数据，或三个数组长度不一致
/// - 对齐长度与文本字符数不同
/// - 片段越界，或查到的时间不是有限值
///
/// 不会产出部分正确的结果：任一单词失败即放弃整张表。
pub fn build_word_timings(
    text: &str,
    spans: &[WordSpan],
    alignment: Option<&AlignmentData>,
) -> Option<Vec<WordTiming>> {
    let alignment = alignment?;

    let len = match alignment.consistent_len() {
        Some(len) => len,
        None => {
            tracing::warn!(
                characters = alignment.characters.len(),
                start_times = alignment.start_times.len(),
                end_times = alignment.end_times.len(),
                "Alignment arrays disagree in length, highlighting disabled"
            );
            return None;
        }
    };

    let text_len = text.chars().count();
    if len != text_len {
        tracing::warn!(
            alignment_len = len,
            text_len = text_len,
            "Alignment length does not match text, highlighting disabled"
        );
        return None;
    }

    let mut timings = Vec::with_capacity(spans.len());
    for span in spans {
        if span.end_char_offset <= span.start_char_offset || span.end_char_offset > len {
            tracing::warn!(
                start = span.start_char_offset,
                end = span.end_char_offset,
                "Word span outside alignment range, highlighting disabled"
            );
            return None;
        }

        let start_time = alignment.start_times[span.start_char_offset];
        let end_time = alignment.end_times[span.end_char_offset - 1];
        if !start_time.is_finite() || !end_time.is_finite() {
            tracing::warn!(word = %span.text, "Non-finite alignment time, highlighting disabled");
            return None;
        }

        timings.push(WordTiming {
            span: span.clone(),
            start_time,
            end_time,
        });
    }

    Some(timings)
}

/// 查找时刻 `t` 应高亮的单词下标
///
/// 对 start_time 做 upper-bound 二分查找后减一得到候选单词，
/// 再校验 `t <= end_time`；落在单词间隙或首词之前时返回 `None`。
pub fn highlighted_index_at(timings: &[WordTiming], t: f64) -> Option<usize> {
    let upper = timings.partition_point(|w| w.start_time <= t);
    let idx = upper.checked_sub(1)?;
    (t <= timings[idx].end_time).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text_segmenter::{UnicodeWordSegmenter, WordSegmenter};

    fn even_alignment(text: &str, step: f64) -> AlignmentData {
        let characters: Vec<String> = text.chars().map(|c| c.to_string()).collect();
        let n = characters.len();
        AlignmentData {
            characters,
            start_times: (0..n).map(|i| i as f64 * step).collect(),
            end_times: (0..n).map(|i| (i + 1) as f64 * step).collect(),
        }
    }

    fn hello_world_timings() -> Vec<WordTiming> {
        let text = "Hello world";
        let spans = UnicodeWordSegmenter::new().segment(text, "en");
        build_word_timings(text, &spans, Some(&even_alignment(text, 0.1))).unwrap()
    }

    #[test]
    fn test_hello_world_scenario() {
        let timings = hello_world_timings();

        assert_eq!(timings.len(), 2);
        assert_eq!(timings[0].span.text, "Hello");
        assert_eq!((timings[0].span.start_char_offset, timings[0].span.end_char_offset), (0, 5));
        assert_eq!((timings[1].span.start_char_offset, timings[1].span.end_char_offset), (6, 11));

        // "Hello": 第 0 个字符开始，第 4 个字符结束
        assert!((timings[0].start_time - 0.0).abs() < 1e-9);
        assert!((timings[0].end_time - 0.5).abs() < 1e-9);
        // "world": 第 6 个字符开始，第 10 个字符结束
        assert!((timings[1].start_time - 0.6).abs() < 1e-9);
        assert!((timings[1].end_time - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_one_timing_per_span_with_ordered_bounds() {
        let text = "It was a dark and stormy night, said the narrator.";
        let spans = UnicodeWordSegmenter::new().segment(text, "en");
        let timings = build_word_timings(text, &spans, Some(&even_alignment(text, 0.05))).unwrap();

        assert_eq!(timings.len(), spans.len());
        assert!(timings.iter().all(|w| w.start_time <= w.end_time));
    }

    #[test]
    fn test_missing_alignment_returns_none() {
        let spans = UnicodeWordSegmenter::new().segment("Hello", "en");
        assert!(build_word_timings("Hello", &spans, None).is_none());
    }

    #[test]
    fn test_mismatched_array_lengths_return_none() {
        let text = "Hello world";
        let spans = UnicodeWordSegmenter::new().segment(text, "en");
        let mut alignment = even_alignment(text, 0.1);
        alignment.end_times.pop();

        assert!(build_word_timings(text, &spans, Some(&alignment)).is_none());
    }

    #[test]
    fn test_text_length_mismatch_returns_none() {
        let spans = UnicodeWordSegmenter::new().segment("Hello world!", "en");
        let alignment = even_alignment("Hello world", 0.1);

        assert!(build_word_timings("Hello world!", &spans, Some(&alignment)).is_none());
    }

    #[test]
    fn test_non_finite_time_abandons_whole_mapping() {
        let text = "Hello world";
        let spans = UnicodeWordSegmenter::new().segment(text, "en");
        let mut alignment = even_alignment(text, 0.1);
        alignment.end_times[10] = f64::NAN;

        assert!(build_word_timings(text, &spans, Some(&alignment)).is_none());
    }

    #[test]
    fn test_out_of_range_span_returns_none() {
        let text = "Hello";
        let spans = vec![WordSpan {
            text: "Hello!".to_string(),
            start_char_offset: 0,
            end_char_offset: 6,
        }];

        assert!(build_word_timings(text, &spans, Some(&even_alignment(text, 0.1))).is_none());
    }

    #[test]
    fn test_highlight_before_first_word() {
        let mut timings = hello_world_timings();
        timings[0].start_time = 0.2;

        assert_eq!(highlighted_index_at(&timings, 0.1), None);
        assert_eq!(highlighted_index_at(&[], 0.5), None);
    }

    #[test]
    fn test_highlight_inside_word() {
        let timings = hello_world_timings();

        assert_eq!(highlighted_index_at(&timings, 0.0), Some(0));
        assert_eq!(highlighted_index_at(&timings, 0.3), Some(0));
        assert_eq!(highlighted_index_at(&timings, 0.5), Some(0));
        assert_eq!(highlighted_index_at(&timings, 0.65), Some(1));
        assert_eq!(highlighted_index_at(&timings, 1.05), Some(1));
    }

    #[test]
    fn test_highlight_in_gap_and_after_end() {
        let timings = hello_world_timings();

        // 空格对应 0.5..0.6 的间隙
        assert_eq!(highlighted_index_at(&timings, 0.55), None);
        assert_eq!(highlighted_index_at(&timings, 1.5), None);
    }
}
