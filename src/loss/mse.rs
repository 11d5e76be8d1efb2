pub struct MseLoss;

impl MseLoss {
    /// Half squared error: (y - t)² / 2
    pub fn loss(prediction: f64, target: f64) -> f64 {
        let d = prediction - target;
        d * d / 2.0
    }

    /// dL/dy = y - t
    pub fn derivative(prediction: f64, target: f64) -> f64 {
        prediction - target
    }
}
