//! Convolution kernel definitions.

/// A 3x3 integer convolution kernel.
///
/// `weights[dy][dx]` applies to the neighbor at offset `(dx - 1, dy - 1)`.
/// There is no divisor: the weighted sum is the output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel3x3 {
    pub weights: [[i32; 3]; 3],
}

impl Kernel3x3 {
    /// Sum of all weights. A sum of 1 means constant input is reproduced.
    pub const fn gain(&self) -> i32 {
        let w = &self.weights;
        w[0][0] + w[0][1] + w[0][2] + w[1][0] + w[1][1] + w[1][2] + w[2][0] + w[2][1] + w[2][2]
    }
}

/// Unity-gain sharpening kernel.
///
/// ```text
///     0  -1   0
///    -1   5  -1
///     0  -1   0
/// ```
pub const SHARPEN: Kernel3x3 = Kernel3x3 {
    weights: [[0, -1, 0], [-1, 5, -1], [0, -1, 0]],
};
