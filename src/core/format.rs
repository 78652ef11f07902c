// Data structures shared by the pipeline stages

/// One ingested `(x, y)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A contiguous run of samples. `start_index` is the absolute index of
/// `data[0]` in the full dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub start_index: usize,
    pub data: Vec<Sample>,
}

impl Chunk {
    pub fn new(start_index: usize, data: Vec<Sample>) -> Self {
        Self { start_index, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn end_index(&self) -> usize {
        self.start_index + self.data.len()
    }
}

/// Half-open index range `[start, start + size)` of the logical dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub size: usize,
}

impl Window {
    pub fn new(start: usize, size: usize) -> Self {
        Self { start, size }
    }

    pub fn end(&self) -> usize {
        self.start.saturating_add(self.size)
    }
}

/// Materialized content of a window, index aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl RawSeries {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            x: Vec::with_capacity(cap),
            y: Vec::with_capacity(cap),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.x.push(sample.x);
        self.y.push(sample.y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One point per bucket. The error vectors are empty when the input was
/// short enough to pass through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownsampledSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub upper_error: Vec<f64>,
    pub lower_error: Vec<f64>,
}

impl DownsampledSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// True when an envelope should be drawn.
    pub fn has_envelope(&self) -> bool {
        !self.upper_error.is_empty()
    }
}
