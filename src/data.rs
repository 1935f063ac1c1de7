//! Hardcoded demo datasets.
//!
//! Both tables are compile-time constants; every chart and report is drawn
//! from them, so rendering output never varies between requests.

/// One row of the review sentiment table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentRow {
    pub category: &'static str,
    pub count: u32,
}

/// One row of the monthly sales table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesRow {
    pub month: &'static str,
    pub sales: u32,
    pub visitors: u32,
    pub revenue: u32,
}

pub const SENTIMENT: [SentimentRow; 3] = [
    SentimentRow { category: "Positive", count: 20 },
    SentimentRow { category: "Neutral", count: 50 },
    SentimentRow { category: "Negative", count: 30 },
];

pub const SALES: [SalesRow; 5] = [
    SalesRow { month: "January", sales: 200, visitors: 150, revenue: 1000 },
    SalesRow { month: "February", sales: 300, visitors: 200, revenue: 1500 },
    SalesRow { month: "March", sales: 250, visitors: 175, revenue: 1250 },
    SalesRow { month: "April", sales: 400, visitors: 300, revenue: 2000 },
    SalesRow { month: "May", sales: 500, visitors: 350, revenue: 2500 },
];

/// A labelled column of values, ready for plotting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub labels: Vec<&'static str>,
    pub values: Vec<u32>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.values.iter().copied().enumerate()
    }
}

pub fn sentiment_counts() -> Series {
    Series {
        labels: SENTIMENT.iter().map(|row| row.category).collect(),
        values: SENTIMENT.iter().map(|row| row.count).collect(),
    }
}

/// Projects one numeric column of the sales table against its months
pub fn sales_column(column: impl Fn(&SalesRow) -> u32) -> Series {
    Series {
        labels: SALES.iter().map(|row| row.month).collect(),
        values: SALES.iter().map(column).collect(),
    }
}
