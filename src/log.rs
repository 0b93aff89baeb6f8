#[collapse_debuginfo(yes)]
macro_rules! trace {
        ($($arg:tt)*) => {
            #[cfg(feature = "defmt")]
            {
                defmt::trace!($($arg)*);
            }
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            {
                log::trace!($($arg)*);
            }
        }
    }
pub(crate) use trace;

#[collapse_debuginfo(yes)]
macro_rules! debug {
        ($($arg:tt)*) => {
            #[cfg(feature = "defmt")]
            {
                defmt::debug!($($arg)*);
            }
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            {
                log::debug!($($arg)*);
            }
        }
    }
pub(crate) use debug;

#[collapse_debuginfo(yes)]
macro_rules! info {
        ($($arg:tt)*) => {
            #[cfg(feature = "defmt")]
            {
                defmt::info!($($arg)*);
            }
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            {
                log::info!($($arg)*);
            }
        }
    }
pub(crate) use info;

#[collapse_debuginfo(yes)]
macro_rules! warni {
        ($($arg:tt)*) => {
            #[cfg(feature = "defmt")]
            {
                defmt::warn!($($arg)*);
            }
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            {
                log::warn!($($arg)*);
            }
        }
    }
pub(crate) use warni as warn;

#[collapse_debuginfo(yes)]
macro_rules! error {
        ($($arg:tt)*) => {
            #[cfg(feature = "defmt")]
            {
                defmt::error!($($arg)*);
            }
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            {
                log::error!($($arg)*);
            }
        }
    }
pub(crate) use error;
