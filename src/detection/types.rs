// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 模型后处理阶段的浮点检测框 (xmin, ymin, width, height)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bbox {
    // a bounding box around an object
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = self.xmax().min(another.xmax());
        let t = self.ymin.max(another.ymin);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        let union = self.union(another);
        if union <= 0.0 {
            return 0.0;
        }
        self.intersection_area(another) / union
    }

    /// 截断为整数像素坐标 (left, top, right, bottom)
    pub fn to_detection(&self) -> Detection {
        Detection::new(
            self.id as u32,
            self.confidence,
            self.xmin as i32,
            self.ymin as i32,
            self.xmax() as i32,
            self.ymax() as i32,
        )
    }
}

/// 整数像素点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 单帧中的一个检测目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Detection {
    /// 坐标会被整理为 x1 <= x2, y1 <= y2
    pub fn new(class_id: u32, confidence: f32, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            class_id,
            confidence,
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// 框中心, 向下取整
    pub fn centroid(&self) -> Point {
        Point::new(
            (self.x1 + self.x2).div_euclid(2),
            (self.y1 + self.y2).div_euclid(2),
        )
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn iou(&self, another: &Detection) -> f32 {
        let l = self.x1.max(another.x1);
        let r = self.x2.min(another.x2);
        let t = self.y1.max(another.y1);
        let b = self.y2.min(another.y2);
        let inter = ((r - l).max(0) as i64 * (b - t).max(0) as i64) as f32;
        let area_a = self.width() as i64 * self.height() as i64;
        let area_b = another.width() as i64 * another.height() as i64;
        let union = (area_a + area_b) as f32 - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }
}

impl std::fmt::Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.centroid();
        write!(
            f,
            "Class: {}, Confidence: {:.2}, Coordinates: ({},{},{},{}), Center: ({},{})",
            self.class_id, self.confidence, self.x1, self.y1, self.x2, self.y2, c.x, c.y
        )
    }
}
