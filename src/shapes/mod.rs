mod shape;
mod sphere;
mod box_shape;

pub use self::shape::Shape;
pub use self::sphere::Sphere;
pub use self::box_shape::BoxShape;
