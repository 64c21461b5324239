use crate::models::LabelSet;
use crate::prediction::{LabelScore, PredictionResult};
use crate::utils::error::ClassifierError;
use crate::Result;

/// 结果格式化器
pub struct ResultFormatter;

impl ResultFormatter {
    /// 将模型输出的概率向量与标签配对
    pub fn format_result(labels: &LabelSet, probabilities: &[f32]) -> Result<PredictionResult> {
        if probabilities.len() != labels.len() {
            return Err(ClassifierError::Inference(format!(
                "Model returned {} scores, expected {}",
                probabilities.len(),
                labels.len()
            )));
        }
        if let Some(i) = probabilities.iter().position(|p| !p.is_finite()) {
            return Err(ClassifierError::Inference(format!(
                "Model returned non-finite score at index {}",
                i
            )));
        }

        let best = argmax(probabilities).ok_or_else(|| {
            ClassifierError::Inference("Model returned an empty score vector".to_string())
        })?;

        let all_predictions: Vec<LabelScore> = labels
            .iter()
            .zip(probabilities)
            .map(|(label, &confidence)| LabelScore {
                label: label.to_string(),
                confidence,
            })
            .collect();

        let top = all_predictions[best].clone();

        Ok(PredictionResult {
            label: top.label,
            confidence: top.confidence,
            all_predictions,
        })
    }
}

/// 最大值下标，并列时取第一个
pub fn argmax(values: &[f32]) -> Option<usize> {
    let (first, rest) = values.split_first()?;
    let mut best = (0, *first);
    for (i, &v) in rest.iter().enumerate() {
        if v > best.1 {
            best = (i + 1, v);
        }
    }
    Some(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.2, 0.2, 0.2, 0.2, 0.2]), Some(0));
        assert_eq!(argmax(&[0.0, 0.0, 0.9]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn keeps_label_order_and_picks_top() {
        let probs = [0.05, 0.7, 0.1, 0.1, 0.05];
        let result = ResultFormatter::format_result(&LabelSet::default(), &probs).unwrap();

        assert_eq!(result.label, "denim");
        assert_eq!(result.confidence, 0.7);

        let labels: Vec<&str> = result.all_predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["cotton", "denim", "net", "silk", "wool"]);

        let sum: f32 = result.all_predictions.iter().map(|p| p.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn top_entry_matches_list_entry() {
        let probs = [0.1, 0.1, 0.1, 0.3, 0.4];
        let result = ResultFormatter::format_result(&LabelSet::default(), &probs).unwrap();
        let best = argmax(&probs).unwrap();
        assert_eq!(result.label, result.all_predictions[best].label);
        assert_eq!(result.confidence, result.all_predictions[best].confidence);
        assert_eq!(result.label, "wool");
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ResultFormatter::format_result(&LabelSet::default(), &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }

    #[test]
    fn rejects_non_finite_scores() {
        let probs = [0.2, f32::NAN, 0.2, 0.2, 0.2];
        let err = ResultFormatter::format_result(&LabelSet::default(), &probs).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(ref m) if m.contains("index 1")));
    }
}
