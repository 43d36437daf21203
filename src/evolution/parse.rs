//! Oracle 回复解析
//!
//! 先从文本中提取 JSON（```json ... ``` 代码块、裸 ``` 代码块或最外层 [...] / {...}），
//! 提取结果解析失败时逐个 `[` / `{` 起点重试，再按生成 / 组合 / 评分三种形状解析。

use serde_json::Value;

use crate::core::EvolveError;
use crate::evolution::types::{Concept, ScoredIdea, Scores};

/// 错误信息中保留的原文长度
const EXCERPT_CHARS: usize = 120;

fn excerpt(text: &str) -> String {
    let mut s: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        s.push('…');
    }
    s
}

/// 提取回复中的 JSON 片段
pub fn extract_json(output: &str) -> &str {
    let trimmed = output.trim();

    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        let body = rest.find("```").map_or(rest, |end| &rest[..end]);
        // 语言标记（json / JSON 等）后可能是 \n、\r\n 或同一行的空格
        return body.trim_start_matches(char::is_alphanumeric).trim();
    }

    let open = trimmed.find(['[', '{']);
    match open {
        Some(start) => {
            let close = if trimmed[start..].starts_with('[') { ']' } else { '}' };
            match trimmed.rfind(close) {
                Some(end) if end > start => &trimmed[start..=end],
                _ => &trimmed[start..],
            }
        }
        None => trimmed,
    }
}

/// 对象，或至少含一个对象的数组；排除正文里 `[1]` 之类的方括号
fn is_structured(v: &Value) -> bool {
    match v {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(Value::is_object),
        _ => false,
    }
}

/// 从左到右尝试每个 `[` / `{` 起点，取第一个能完整解析的结构化值
fn first_structured_value(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| matches!(c, '[' | '{'))
        .find_map(|(i, _)| {
            serde_json::Deserializer::from_str(&text[i..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
                .filter(is_structured)
        })
}

fn parse_value(output: &str) -> Result<Value, EvolveError> {
    let json_str = extract_json(output);
    match serde_json::from_str(json_str) {
        Ok(value) => Ok(value),
        Err(e) => first_structured_value(output).ok_or_else(|| {
            EvolveError::MalformedResponse(format!("{}: {}", e, excerpt(json_str)))
        }),
    }
}

fn text_field<'a>(v: &'a Value, key: &str) -> Result<&'a str, EvolveError> {
    v.get(key).and_then(Value::as_str).ok_or_else(|| {
        EvolveError::MalformedResponse(format!("missing string field '{}' in {}", key, excerpt(&v.to_string())))
    })
}

fn concept_from_value(v: &Value) -> Result<Concept, EvolveError> {
    Concept::new(text_field(v, "title")?, text_field(v, "description")?)
}

/// 单个数组元素的解析结果
pub type ItemResult = Result<Concept, EvolveError>;

/// 生成阶段：`[{title, description}, ...]`
///
/// 整体不是 JSON 数组时返回错误；逐个元素的问题作为该元素的 Err 返回，由调用方决定丢弃
pub fn parse_generation(output: &str) -> Result<Vec<ItemResult>, EvolveError> {
    let value = parse_value(output)?;
    let items = match value {
        Value::Array(items) => items,
        // 有的模型会包一层 {"ideas": [...]}
        Value::Object(mut map) => match map.remove("ideas") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(EvolveError::MalformedResponse(
                    "expected a JSON array of ideas".to_string(),
                ))
            }
        },
        _ => {
            return Err(EvolveError::MalformedResponse(
                "expected a JSON array of ideas".to_string(),
            ))
        }
    };
    Ok(items.iter().map(concept_from_value).collect())
}

/// 组合阶段：`{title, description}`
pub fn parse_combination(output: &str) -> Result<Concept, EvolveError> {
    let value = parse_value(output)?;
    // 偶尔会回一个只含一个元素的数组
    let value = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    concept_from_value(&value)
}

fn score_field(score: &Value, axis: &str) -> Result<u8, EvolveError> {
    let raw = score
        .get(axis)
        .ok_or_else(|| EvolveError::MalformedResponse(format!("missing score '{}'", axis)))?;
    let n = raw.as_i64().ok_or_else(|| {
        EvolveError::MalformedResponse(format!("score '{}' is not an integer: {}", axis, raw))
    })?;
    u8::try_from(n)
        .ok()
        .filter(|v| *v <= crate::evolution::types::MAX_SCORE)
        .ok_or_else(|| EvolveError::MalformedResponse(format!("score '{}' = {} is outside 0..=10", axis, n)))
}

/// 评分阶段：`{title, description, score: {implementation, usefulness, innovation}}`
///
/// 标题 / 描述缺失或为空时沿用被评估的原想法；三项分数缺一不可
pub fn parse_evaluation(output: &str, original: &Concept) -> Result<ScoredIdea, EvolveError> {
    let value = parse_value(output)?;
    let value = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    let score = value
        .get("score")
        .filter(|s| s.is_object())
        .ok_or_else(|| EvolveError::MalformedResponse(format!("missing 'score' object in {}", excerpt(&value.to_string()))))?;

    let scores = Scores::new(
        score_field(score, "implementation")?,
        score_field(score, "usefulness")?,
        score_field(score, "innovation")?,
    )?;

    let concept = concept_from_value(&value).unwrap_or_else(|_| original.clone());
    Ok(ScoredIdea::new(concept, scores))
}
