mod angular_indices;
pub use angular_indices::AngularIndices;

mod csv_reader;
pub use csv_reader::{read_formatted_csv, read_normalized_csv, write_normalized_csv};

mod observation_set;
pub use observation_set::ObservationSet;

mod quantity;
pub use quantity::QuantityType;

mod record;
pub use record::DataRecord;
