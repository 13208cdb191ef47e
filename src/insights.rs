use crate::forecast::Forecast;
use crate::utils::{first_differences, format_thousands, mean, sample_std};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn from_mean_change(change: f64) -> Self {
        if change > 0.0 {
            Self::Up
        } else if change < 0.0 {
            Self::Down
        } else {
            Self::Stable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "tăng",
            Self::Down => "giảm",
            Self::Stable => "ổn định",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalStrength {
    Strong,
    Weak,
}

impl SeasonalStrength {
    pub fn label(self) -> &'static str {
        match self {
            Self::Strong => "mạnh",
            Self::Weak => "yếu",
        }
    }
}

/// Rule-based Vietnamese commentary on the revenue series.
pub struct InsightGenerator {
    emphasis_threshold: f64,
    strength_ratio: f64,
    currency: String,
}

impl InsightGenerator {
    pub fn new(emphasis_threshold: f64, strength_ratio: f64, currency: impl Into<String>) -> Self {
        Self {
            emphasis_threshold,
            strength_ratio,
            currency: currency.into(),
        }
    }

    /// Trend sentence(s), then the seasonal sentence, then the forecast sentence.
    pub fn generate(&self, revenue: &[f64], forecast: Option<&Forecast>) -> Vec<String> {
        let mut messages = Vec::new();

        let trend_mean = mean(&first_differences(revenue)).unwrap_or(0.0);
        let direction = TrendDirection::from_mean_change(trend_mean);
        messages.push(trend_sentence(direction));
        if trend_mean > self.emphasis_threshold {
            messages.push(format!(
                "Mức tăng trung bình mỗi kỳ khoảng {} {}, đà tăng trưởng rất mạnh, nên tận dụng để mở rộng quy mô bán hàng.",
                format_thousands(trend_mean),
                self.currency
            ));
        } else if trend_mean < -self.emphasis_threshold {
            messages.push(format!(
                "Mức giảm trung bình mỗi kỳ khoảng {} {}, cần rà soát ngay giá bán, thực đơn và chi phí.",
                format_thousands(trend_mean.abs()),
                self.currency
            ));
        }

        messages.push(match self.seasonal_strength(revenue) {
            SeasonalStrength::Strong => format!(
                "Tính mùa vụ {}: doanh thu dao động rõ rệt theo chu kỳ, nên chuẩn bị nguyên liệu và nhân sự cho các thời điểm cao điểm.",
                SeasonalStrength::Strong.label()
            ),
            SeasonalStrength::Weak => format!(
                "Tính mùa vụ {}: doanh thu khá đồng đều giữa các thời điểm, có thể giữ kế hoạch nhập hàng ổn định.",
                SeasonalStrength::Weak.label()
            ),
        });

        if let Some(forecast) = forecast {
            messages.push(format!(
                "Dự báo kỳ tới: doanh thu khoảng {} {}, lợi nhuận khoảng {} {}.",
                format_thousands(forecast.predicted_revenue),
                self.currency,
                format_thousands(forecast.predicted_profit),
                self.currency
            ));
        }

        messages
    }

    /// Strong when the sample std exceeds `strength_ratio` of the peak-to-trough range.
    pub fn seasonal_strength(&self, revenue: &[f64]) -> SeasonalStrength {
        let Some(std) = sample_std(revenue) else {
            return SeasonalStrength::Weak;
        };
        let max = revenue.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = revenue.iter().copied().fold(f64::INFINITY, f64::min);

        if std > self.strength_ratio * (max - min) {
            SeasonalStrength::Strong
        } else {
            SeasonalStrength::Weak
        }
    }
}

fn trend_sentence(direction: TrendDirection) -> String {
    match direction {
        TrendDirection::Up => format!(
            "Doanh thu có xu hướng {} trong giai đoạn này.",
            direction.label()
        ),
        TrendDirection::Down => format!(
            "Doanh thu có xu hướng {} trong giai đoạn này, cần theo dõi sát.",
            direction.label()
        ),
        TrendDirection::Stable => format!(
            "Doanh thu nhìn chung {}, chưa có biến động đáng kể.",
            direction.label()
        ),
    }
}
