/// 生成一个包装 `usize` 下标的 newtype, 用作 arena 中的稳定编号.
#[macro_export]
macro_rules! index_type {
    ($($(#[$m:meta])* $p:vis struct $name:ident($prefix:literal);)*) => {
        $(
            $(#[$m])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            $p struct $name(usize);

            impl $name {
                #[must_use]
                pub const fn new(raw: usize) -> Self {
                    Self(raw)
                }

                #[must_use]
                pub const fn index(self) -> usize {
                    self.0
                }
            }

            impl From<usize> for $name {
                fn from(raw: usize) -> Self {
                    Self(raw)
                }
            }

            impl std::fmt::Debug for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.pad(&format!(concat!($prefix, "{}"), self.0))
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.pad(&self.0.to_string())
                }
            }
        )*
    };
}
