// Storage backend tests against the in-memory fakes
mod hdfs;
mod object;
